// Interface adapters: wire protocol, socket handling, console input and rendering.

pub mod clients;
pub mod input;
pub mod net;
pub mod protocol;
pub mod view;
