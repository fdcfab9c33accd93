mod command;
mod dispatcher;
mod shared;

pub(crate) use command::Command;
pub(crate) use dispatcher::Dispatcher;
pub(crate) use shared::Shared;
