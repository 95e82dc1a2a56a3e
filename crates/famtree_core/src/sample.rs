//! Demo family seeded into an empty tree.

use crate::model::member::{format_timestamp, Gender, Member};
use chrono::{DateTime, Utc};

struct SampleRow {
    id: &'static str,
    name: &'static str,
    gender: Gender,
    dob: &'static str,
    birth_place: &'static str,
    occupation: &'static str,
    email: &'static str,
    bio: &'static str,
    spouse: Option<&'static str>,
    father: Option<&'static str>,
    mother: Option<&'static str>,
    children: &'static [&'static str],
}

const SAMPLE_ROWS: &[SampleRow] = &[
    SampleRow {
        id: "sample_1",
        name: "Rajesh Kumar",
        gender: Gender::Male,
        dob: "1968-05-12",
        birth_place: "New Delhi, India",
        occupation: "Engineer",
        email: "rajesh.kumar@email.com",
        bio: "Loves classical music and reading. Has been working as an engineer for 30 years.",
        spouse: Some("sample_2"),
        father: None,
        mother: None,
        children: &["sample_3", "sample_4"],
    },
    SampleRow {
        id: "sample_2",
        name: "Sushma Kumar",
        gender: Gender::Female,
        dob: "1970-07-21",
        birth_place: "Mumbai, India",
        occupation: "Doctor",
        email: "sushma.kumar@email.com",
        bio: "Pediatrician with 25 years of experience. Enjoys gardening and painting.",
        spouse: Some("sample_1"),
        father: None,
        mother: None,
        children: &["sample_3", "sample_4"],
    },
    SampleRow {
        id: "sample_3",
        name: "Amit Kumar",
        gender: Gender::Male,
        dob: "1995-12-01",
        birth_place: "Bangalore, India",
        occupation: "Software Developer",
        email: "amit.kumar@email.com",
        bio: "Full-stack developer passionate about AI and machine learning.",
        spouse: None,
        father: Some("sample_1"),
        mother: Some("sample_2"),
        children: &[],
    },
    SampleRow {
        id: "sample_4",
        name: "Priya Kumar",
        gender: Gender::Female,
        dob: "1998-09-18",
        birth_place: "Chennai, India",
        occupation: "Graphic Designer",
        email: "priya.kumar@email.com",
        bio: "Creative designer specializing in branding and UI/UX design.",
        spouse: None,
        father: Some("sample_1"),
        mother: Some("sample_2"),
        children: &[],
    },
];

/// Builds the two-generation sample family stamped at `now`.
pub fn sample_family(now: DateTime<Utc>) -> Vec<Member> {
    let timestamp = format_timestamp(now);
    SAMPLE_ROWS
        .iter()
        .map(|row| Member {
            id: row.id.to_string(),
            name: row.name.to_string(),
            gender: row.gender,
            dob: row.dob.to_string(),
            birth_place: row.birth_place.to_string(),
            occupation: row.occupation.to_string(),
            email: row.email.to_string(),
            bio: row.bio.to_string(),
            photo: String::new(),
            spouse: row.spouse.map(str::to_string),
            father: row.father.map(str::to_string),
            mother: row.mother.map(str::to_string),
            children: row.children.iter().map(|id| id.to_string()).collect(),
            created_at: timestamp.clone(),
            updated_at: timestamp.clone(),
        })
        .collect()
}
