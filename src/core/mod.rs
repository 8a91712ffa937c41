pub mod events;
pub mod http_client;
pub mod url_parser;
pub mod ytdlp;
