#![allow(dead_code)]

pub mod logs;
