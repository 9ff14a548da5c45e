pub mod cache;

pub mod config;

pub mod controller;

pub mod grouping;

pub mod model;

pub mod portal;

pub mod storage;
