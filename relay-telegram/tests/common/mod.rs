#![allow(dead_code)]

pub mod fake_chat_api;
