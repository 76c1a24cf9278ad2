//! `RoundingContext` governs how many digits `BigDecimal::div` carries and
//! which rule breaks ties when the quotient doesn't terminate, since most
//! divisions (here, 1/3) have no exact decimal representation.

use solid_temporal::decimal::{RoundingContext, RoundingDirection};
use solid_temporal::BigDecimal;
use std::str::FromStr;

fn main() {
    let one = BigDecimal::from_str("1").unwrap();
    let three = BigDecimal::from_str("3").unwrap();

    for direction in [
        RoundingDirection::Up,
        RoundingDirection::Down,
        RoundingDirection::TowardZero,
        RoundingDirection::AwayFromZero,
        RoundingDirection::ToNearestOrEven,
        RoundingDirection::ToNearestOrAwayFromZero,
    ] {
        let ctx = RoundingContext { precision: 6, direction };
        println!("1/3 at precision 6, {direction:?}: {}", one.div(&three, ctx));
    }

    let coarse = RoundingContext { precision: 2, direction: RoundingDirection::ToNearestOrEven };
    let fine = RoundingContext { precision: 20, direction: RoundingDirection::ToNearestOrEven };
    println!("1/3 at precision 2: {}", one.div(&three, coarse));
    println!("1/3 at precision 20: {}", one.div(&three, fine));
}
