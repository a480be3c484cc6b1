use clap::Parser;

#[derive(Parser)]
#[command(name = "hordebrowse")]
#[command(author, version, about = "Browse media metadata and open assets through bithorde")]
pub struct Cli {
    /// Initial browse location; only assets whose path lies below it are listed
    pub path: Option<String>,
}
