// Concrete metadata providers

mod ytdlp;

pub use ytdlp::YtDlpProvider;
