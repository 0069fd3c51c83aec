//! Integration tests: the services wired over a temporary data directory


mod circulation;
mod persistence;
mod reservations;
mod stats;
