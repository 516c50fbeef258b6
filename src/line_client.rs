//! Interactive line client
//!
//! Bridges a local line source (stdin for the `chat_client` binary) and sink
//! (stdout) to one relay connection. Every input line is sent as-is with a
//! trailing `\n`; every line the relay sends is written to the sink.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Run a client session until the relay closes the connection
///
/// When the input ends, the write half is shut down and the session keeps
/// printing relay lines until the relay closes its end.
pub async fn run_client<I, O>(stream: TcpStream, input: I, mut output: O) -> std::io::Result<()>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let (reader, mut writer) = stream.into_split();
    let mut server_lines = BufReader::new(reader).lines();
    let mut input_lines = input.lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            line = server_lines.next_line() => {
                let Some(line) = line? else {
                    info!("Connection closed by relay");
                    break;
                };
                output.write_all(line.as_bytes()).await?;
                output.write_all(b"\n").await?;
                output.flush().await?;
            }
            line = input_lines.next_line(), if input_open => {
                match line? {
                    Some(line) => {
                        writer.write_all(line.as_bytes()).await?;
                        writer.write_all(b"\n").await?;
                    }
                    None => {
                        debug!("Input closed, shutting down write half");
                        writer.shutdown().await?;
                        input_open = false;
                    }
                }
            }
        }
    }

    Ok(())
}
