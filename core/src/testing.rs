//! Record builders shared by unit tests.

use crate::dataset::{Record, Room, Section};

pub fn section(uuid: &str, dept: &str, avg: f64) -> Record {
    Record::Section(Section {
        dept: dept.to_string(),
        id: "310".to_string(),
        title: "software eng".to_string(),
        instructor: "".to_string(),
        uuid: uuid.to_string(),
        year: 2015.0,
        avg,
        pass: 10.0,
        fail: 1.0,
        audit: 0.0,
    })
}

pub fn section_with(uuid: &str, dept: &str, id: &str, instructor: &str, avg: f64) -> Record {
    Record::Section(Section {
        dept: dept.to_string(),
        id: id.to_string(),
        title: format!("{} {}", dept, id),
        instructor: instructor.to_string(),
        uuid: uuid.to_string(),
        year: 2015.0,
        avg,
        pass: 10.0,
        fail: 1.0,
        audit: 0.0,
    })
}

pub fn room(shortname: &str, number: &str, seats: f64, furniture: &str) -> Record {
    Record::Room(Room {
        fullname: format!("{} Building", shortname),
        shortname: shortname.to_string(),
        number: number.to_string(),
        name: format!("{}_{}", shortname, number),
        address: "6245 Agronomy Road V6T 1Z4".to_string(),
        room_type: "Small Group".to_string(),
        furniture: furniture.to_string(),
        href: format!("http://rooms.example/{}-{}", shortname, number),
        lat: 49.26,
        lon: -123.25,
        seats,
    })
}

/// `n` sections with distinct uuids and averages cycling through 50..100.
pub fn many_sections(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| section(&i.to_string(), "cpsc", 50.0 + (i % 50) as f64))
        .collect()
}
