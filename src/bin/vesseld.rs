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

//! The server binary: loads config, initializes logging, and runs the
//! accept loop.

use std::path::PathBuf;

use clap::Parser;
use vessel::config::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "vesseld", about = "Personal-information-management storage and synchronization server")]
struct Args {
    /// Path to an ini-style config file (defaults are used for any
    /// field it leaves unset, and for a file that doesn't exist).
    #[arg(long, default_value = "/etc/vessel/vesseld.conf")]
    config: PathBuf,

    /// Address to listen on, overriding the config file's socket path
    /// (this core speaks its framed protocol over TCP).
    #[arg(long, default_value = "127.0.0.1:9191")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::load(&args.config)?;
    vessel::server::run(config, &args.listen).await?;
    Ok(())
}
