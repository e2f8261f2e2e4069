mod conversation_test;
mod message_test;
