// Library module for testable crawler components

pub mod crawler;
