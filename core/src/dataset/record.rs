use serde::{Deserialize, Serialize};

use super::{DatasetKind, Field, Value};

/// One course offering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Section {
    pub dept: String,
    pub id: String,
    pub title: String,
    pub instructor: String,
    pub uuid: String,
    pub year: f64,
    pub avg: f64,
    pub pass: f64,
    pub fail: f64,
    pub audit: f64,
}

/// One campus room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Room {
    pub fullname: String,
    pub shortname: String,
    pub number: String,
    pub name: String,
    pub address: String,
    #[serde(rename = "type")]
    pub room_type: String,
    pub furniture: String,
    pub href: String,
    pub lat: f64,
    pub lon: f64,
    pub seats: f64,
}

/// A stored record. Serialized without a tag; the two shapes share no fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Section(Section),
    Room(Room),
}

impl Record {
    pub fn kind(&self) -> DatasetKind {
        match self {
            Record::Section(_) => DatasetKind::Sections,
            Record::Room(_) => DatasetKind::Rooms,
        }
    }

    pub fn natural_id(&self) -> &str {
        match self {
            Record::Section(s) => &s.uuid,
            Record::Room(r) => &r.href,
        }
    }

    /// Numeric value of `field`, or `None` for string fields and fields of the other kind.
    pub fn number(&self, field: Field) -> Option<f64> {
        match (self, field) {
            (Record::Section(s), Field::Year) => Some(s.year),
            (Record::Section(s), Field::Avg) => Some(s.avg),
            (Record::Section(s), Field::Pass) => Some(s.pass),
            (Record::Section(s), Field::Fail) => Some(s.fail),
            (Record::Section(s), Field::Audit) => Some(s.audit),
            (Record::Room(r), Field::Lat) => Some(r.lat),
            (Record::Room(r), Field::Lon) => Some(r.lon),
            (Record::Room(r), Field::Seats) => Some(r.seats),
            _ => None,
        }
    }

    /// String value of `field`, or `None` for numeric fields and fields of the other kind.
    pub fn text(&self, field: Field) -> Option<&str> {
        let s = match (self, field) {
            (Record::Section(s), Field::Dept) => &s.dept,
            (Record::Section(s), Field::Id) => &s.id,
            (Record::Section(s), Field::Title) => &s.title,
            (Record::Section(s), Field::Instructor) => &s.instructor,
            (Record::Section(s), Field::Uuid) => &s.uuid,
            (Record::Room(r), Field::Fullname) => &r.fullname,
            (Record::Room(r), Field::Shortname) => &r.shortname,
            (Record::Room(r), Field::Number) => &r.number,
            (Record::Room(r), Field::Name) => &r.name,
            (Record::Room(r), Field::Address) => &r.address,
            (Record::Room(r), Field::Type) => &r.room_type,
            (Record::Room(r), Field::Furniture) => &r.furniture,
            (Record::Room(r), Field::Href) => &r.href,
            _ => return None,
        };
        Some(s)
    }

    pub fn value(&self, field: Field) -> Option<Value> {
        if field.is_numeric() {
            self.number(field).map(Value::Number)
        } else {
            self.text(field).map(Value::from)
        }
    }
}

impl From<Section> for Record {
    fn from(s: Section) -> Self {
        Record::Section(s)
    }
}

impl From<Room> for Record {
    fn from(r: Room) -> Self {
        Record::Room(r)
    }
}
