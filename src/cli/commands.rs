//! Command implementations for the docindex binaries.

use std::time::Duration;

use crate::cli::args::{ClientArgs, ServerArgs};
use crate::cli::output::{ResponseOutput, output_response};
use crate::client::Client;
use crate::config::ServerConfig;
use crate::error::Result;
use crate::server::Server;
use crate::transport::FifoTransport;

/// Merge the config file (if any) with command line overrides.
pub fn build_server_config(args: &ServerArgs) -> Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from {}", path.display());
            ServerConfig::from_file(path)?
        }
        None => ServerConfig::default(),
    };

    config.document_root = args.document_root.clone();
    if let Some(cache_size) = args.cache_size {
        config = config.with_cache_size(cache_size);
    }
    if let Some(data_dir) = &args.data_dir {
        config = config.with_data_dir(data_dir);
    }
    if let Some(channel) = &args.channel {
        config = config.with_server_channel(channel);
    }
    if let Some(matcher) = args.matcher {
        config = config.with_matcher(matcher);
    }

    config.validate()
}

/// Run the server until it receives SHUTDOWN.
pub fn run_server(args: ServerArgs) -> Result<()> {
    let config = build_server_config(&args)?;
    let channel = config.server_channel.clone();

    let mut server = Server::open(config)?;
    let mut transport = FifoTransport::create(&channel)?;
    server.run(&mut transport)
}

/// Send one request and print the response.
pub fn execute_client(args: ClientArgs) -> Result<()> {
    let client = Client::new(&args.channel)
        .with_timeout(args.timeout_secs.map(Duration::from_secs));

    let request = args.command.to_request();
    let response = client.send(&request)?;

    output_response(
        &ResponseOutput::new(request.command(), response),
        args.output_format,
    )
}
