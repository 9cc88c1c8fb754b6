use crate::{
    api::LocalTaskStore,
    libs::{config::Config, messages::Message},
    msg_info, msg_success, msg_warning,
};
use anyhow::Result;

pub fn cmd() -> Result<()> {
    if let Some(server) = Config::read()?.server {
        msg_warning!(Message::UsingServer(server.api_url));
    }

    match LocalTaskStore::open()?.seed()? {
        0 => msg_info!(Message::StoreAlreadySeeded),
        count => msg_success!(Message::StoreSeeded(count)),
    }
    Ok(())
}
