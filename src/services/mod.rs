pub mod m3u_parser;
pub mod player;
pub mod playlist_source;
pub mod protocol;
