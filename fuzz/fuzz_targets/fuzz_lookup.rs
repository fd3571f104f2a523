#![no_main]
use libfuzzer_sys::fuzz_target;
use std::net::Ipv4Addr;

fuzz_target!(|data: &[u8]| {
    // First four bytes pick the address, the rest is the database file.
    // Garbage files may error but must never panic or read out of bounds.
    if data.len() < 4 {
        return;
    }
    let addr = Ipv4Addr::new(data[0], data[1], data[2], data[3]);
    if let Ok(db) = datx::Database::from_bytes(data[4..].to_vec()) {
        let _ = db.lookup_v4(addr);
        let _ = db.lookup_v4(Ipv4Addr::UNSPECIFIED);
        let _ = db.lookup_v4(Ipv4Addr::BROADCAST);
        let _ = db.info();
    }
});
