//! yt-dlp `--dump-single-json --flat-playlist` payloads.

#![allow(dead_code)]

pub const SINGLE_VIDEO: &str = r#"{"id":"dQw4w9WgXcQ","title":"Never Gonna Give You Up","duration":212,"thumbnail":"https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg","uploader":"Rick Astley","view_count":1500000000,"description":"The official video","webpage_url":"https://www.youtube.com/watch?v=dQw4w9WgXcQ"}"#;

/// Four entries; the second and fourth carry no `url`.
pub const PLAYLIST: &str = r#"{"_type":"playlist","id":"PL123","title":"Road trip","entries":[
{"_type":"url","id":"aaaaaaaaaaa","title":"First","duration":61,"uploader":"One","url":"https://www.youtube.com/watch?v=aaaaaaaaaaa"},
{"_type":"url","id":"bbbbbbbbbbb","title":"Second","duration":62,"uploader":"Two"},
{"_type":"url","id":"ccccccccccc","title":"Third","duration":63,"uploader":"Three","url":"https://www.youtube.com/watch?v=ccccccccccc"},
{"_type":"url","id":"ddddddddddd","title":"Fourth"}
]}"#;

pub const PLAYLIST_IDS: [&str; 4] = ["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc", "ddddddddddd"];
