mod chunks;

pub use chunks::into_chat_stream;
