//! Name generation utilities

use crate::components::{Gender, Name};
use rand::Rng;

/// Generate a random name for a founding villager
pub fn generate_name(gender: Gender, rng: &mut impl Rng) -> Name {
    let family = FAMILY_NAMES[rng.gen_range(0..FAMILY_NAMES.len())];
    Name::new(generate_given_name(gender, rng), family)
}

pub fn generate_given_name(gender: Gender, rng: &mut impl Rng) -> &'static str {
    let pool = match gender {
        Gender::Male => MALE_NAMES,
        Gender::Female => FEMALE_NAMES,
    };
    pool[rng.gen_range(0..pool.len())]
}

/// Children take the father's family name
pub fn name_child(gender: Gender, family: &str, rng: &mut impl Rng) -> Name {
    Name::new(generate_given_name(gender, rng), family)
}

// Sample name lists - would be loaded from data files in production
static MALE_NAMES: &[&str] = &[
    "Aldric", "Bram", "Cedric", "Dunstan", "Edmund", "Finn", "Godric", "Hal", "Ivo", "Jory",
    "Kenric", "Leof", "Merek", "Nyle", "Osric", "Piers", "Rowan", "Sigurd", "Tobin", "Ulric",
    "Wat", "Alaric", "Bertram", "Corwin",
];

static FEMALE_NAMES: &[&str] = &[
    "Aelis", "Brea", "Cwen", "Daria", "Edith", "Freya", "Gisela", "Hild", "Isolde", "Jocosa",
    "Kenna", "Liora", "Maud", "Nesta", "Odile", "Petra", "Rowena", "Sigrid", "Tamsin", "Una",
    "Wynn", "Agnes", "Brigid", "Cora",
];

static FAMILY_NAMES: &[&str] = &[
    "Ashford", "Barrow", "Cole", "Dale", "Eastwood", "Fairweather", "Greenhill", "Hale", "Ironside",
    "Juniper", "Kettle", "Longbrook", "Marsh", "Northcott", "Oakes", "Pike", "Quarry", "Reed",
    "Stonebridge", "Thatcher", "Underhill", "Vale", "Weaver", "Yarrow", "Fisher", "Smith",
    "Wright", "Mill",
];
