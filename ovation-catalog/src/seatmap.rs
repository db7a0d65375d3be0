use ovation_shared::{Seat, ZoneInfo};

/// Generates the seat rows for a zone at venue setup time. Seats are
/// numbered row-major: A1..A{row_width}, B1.., up to the zone capacity.
pub fn build_zone_seats(zone: &ZoneInfo, row_width: u32) -> Vec<Seat> {
    let width = row_width.max(1);
    (0..zone.capacity)
        .map(|i| {
            let row = (b'A' + (i / width) as u8) as char;
            let number = i % width + 1;
            Seat::new(zone.concert_id, zone.zone_id, format!("{}{}", row, number))
        })
        .collect()
}
