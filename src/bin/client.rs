//! microkv-cli - interactive terminal client
//!
//! Reads a line, splits it on whitespace, sends it as a request frame and
//! prints the decoded reply. `quit` hangs up.

use anyhow::{bail, Context};
use bytes::BytesMut;
use clap::Parser;
use microkv::protocol::{encode_command, FrameParser, Reply};
use microkv::{DEFAULT_HOST, DEFAULT_PORT};
use tokio::io::{self, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "microkv-cli")]
#[command(version)]
#[command(about = "Interactive client for a microkv server", long_about = None)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = DEFAULT_HOST)]
    address: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let addr = format!("{}:{}", args.address, args.port);
    let mut stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("could not connect to {}", addr))?;
    debug!(server = %addr, "Connected");

    let prompt = format!("microkv://{}> ", addr);
    let parser = FrameParser::new();
    let mut buffer = BytesMut::with_capacity(4096);
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => continue,
            ["quit"] => {
                stream.write_all(b"quit\r\n").await?;
                break;
            }
            _ => {}
        }

        stream.write_all(&encode_command(&words)).await?;
        let reply = read_reply(&mut stream, &parser, &mut buffer).await?;

        stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
    }

    Ok(())
}

/// Reads from the socket until one full reply is buffered.
async fn read_reply(
    stream: &mut TcpStream,
    parser: &FrameParser,
    buffer: &mut BytesMut,
) -> anyhow::Result<Reply> {
    loop {
        if let Some((reply, consumed)) = parser.parse_reply(&buffer[..])? {
            let _ = buffer.split_to(consumed);
            return Ok(reply);
        }

        if stream.read_buf(buffer).await? == 0 {
            bail!("server closed the connection");
        }
    }
}
