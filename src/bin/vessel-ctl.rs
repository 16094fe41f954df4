//   Copyright (c) 2024-2026 The Vessel Authors
//   All rights reserved.
//
//   Permission is hereby granted, free of charge, to any person obtaining a copy
//   of this software and associated documentation files (the "Software"), to deal
//   in the Software without restriction, including without limitation the rights
//   to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//   copies of the Software, and to permit persons to whom the Software is
//   furnished to do so, subject to the following conditions:
//
//   The above copyright notice and this permission notice shall be included in all
//   copies or substantial portions of the Software.
//
//   THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//   IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//   FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//   AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//   LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//   OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
//   SOFTWARE.

//! A minimal operations CLI: connects to a running server and issues a
//! single command, printing the response. Useful for smoke-testing a
//! deployment without a full client library.

use clap::{Parser, Subcommand};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use vessel::wire::command::SearchCmd;
use vessel::wire::{Command, RequestFrame, Response, ResponseCodec};

#[derive(Parser, Debug)]
#[command(name = "vessel-ctl", about = "Operations client for a vessel server")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:9191")]
    server: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Check that the server is reachable and speaking the protocol.
    Ping,
    /// Authenticate a session, then log out immediately.
    Login { session_id: String },
    /// Run a best-effort search query.
    Search { query: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let stream = TcpStream::connect(&args.server).await?;
    let mut framed = Framed::new(stream, ResponseCodec);

    let command = match args.command {
        Cmd::Ping => Command::Hello,
        Cmd::Login { session_id } => Command::Login { session_id },
        Cmd::Search { query } => Command::Search(SearchCmd {
            query,
            mime_types: Vec::new(),
            collections: Vec::new(),
        }),
    };

    framed.send(RequestFrame { tag: 1, command }).await?;
    match framed.next().await {
        Some(Ok(frame)) => print_response(frame.response),
        Some(Err(e)) => anyhow::bail!("protocol error: {e}"),
        None => anyhow::bail!("server closed the connection without responding"),
    }
    Ok(())
}

fn print_response(response: Response) {
    match response {
        Response::Ok => println!("ok"),
        Response::Error { message, terminal } => println!("error (terminal={terminal}): {message}"),
        Response::HelloAck { protocol_version } => println!("hello ack, protocol version {protocol_version}"),
        Response::LoginAck => println!("login ack"),
        Response::SearchResult(ids) => println!("{} result(s): {ids:?}", ids.len()),
        other => println!("{other:?}"),
    }
}
