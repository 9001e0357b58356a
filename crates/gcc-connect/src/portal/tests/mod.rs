mod common;

mod accounts;
mod admin;
