use std::fmt;

use serde::{Deserialize, Serialize};

/// Which record schema a dataset holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Sections,
    Rooms,
}

impl DatasetKind {
    pub fn fields(self) -> &'static [Field] {
        match self {
            DatasetKind::Sections => &Field::SECTIONS,
            DatasetKind::Rooms => &Field::ROOMS,
        }
    }

    /// Field whose value identifies a record within its dataset.
    pub fn natural_id(self) -> Field {
        match self {
            DatasetKind::Sections => Field::Uuid,
            DatasetKind::Rooms => Field::Href,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DatasetKind::Sections => "sections",
            DatasetKind::Rooms => "rooms",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sections" => Some(DatasetKind::Sections),
            "rooms" => Some(DatasetKind::Rooms),
            _ => None,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record field addressable from a query.
///
/// The sections and rooms field sets are disjoint, so a field alone
/// determines the dataset kind it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    // Sections
    Dept,
    Id,
    Title,
    Instructor,
    Uuid,
    Year,
    Avg,
    Pass,
    Fail,
    Audit,

    // Rooms
    Fullname,
    Shortname,
    Number,
    Name,
    Address,
    Type,
    Furniture,
    Href,
    Lat,
    Lon,
    Seats,
}

impl Field {
    pub const SECTIONS: [Field; 10] = [
        Field::Dept,
        Field::Id,
        Field::Title,
        Field::Instructor,
        Field::Uuid,
        Field::Year,
        Field::Avg,
        Field::Pass,
        Field::Fail,
        Field::Audit,
    ];

    pub const ROOMS: [Field; 11] = [
        Field::Fullname,
        Field::Shortname,
        Field::Number,
        Field::Name,
        Field::Address,
        Field::Type,
        Field::Furniture,
        Field::Href,
        Field::Lat,
        Field::Lon,
        Field::Seats,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Dept => "dept",
            Field::Id => "id",
            Field::Title => "title",
            Field::Instructor => "instructor",
            Field::Uuid => "uuid",
            Field::Year => "year",
            Field::Avg => "avg",
            Field::Pass => "pass",
            Field::Fail => "fail",
            Field::Audit => "audit",
            Field::Fullname => "fullname",
            Field::Shortname => "shortname",
            Field::Number => "number",
            Field::Name => "name",
            Field::Address => "address",
            Field::Type => "type",
            Field::Furniture => "furniture",
            Field::Href => "href",
            Field::Lat => "lat",
            Field::Lon => "lon",
            Field::Seats => "seats",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::SECTIONS
            .iter()
            .chain(Field::ROOMS.iter())
            .copied()
            .find(|f| f.name() == name)
    }

    pub fn kind(self) -> DatasetKind {
        if Field::SECTIONS.contains(&self) {
            DatasetKind::Sections
        } else {
            DatasetKind::Rooms
        }
    }

    /// Numeric fields accept GT/LT/EQ and numeric APPLY tokens; the rest are strings.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Field::Year
                | Field::Avg
                | Field::Pass
                | Field::Fail
                | Field::Audit
                | Field::Lat
                | Field::Lon
                | Field::Seats
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
