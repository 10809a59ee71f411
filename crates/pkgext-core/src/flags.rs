//! Yes/no attributes packed into a single bitmask column

use crate::parse::YesNo;

/// One attribute mapped to one bit. The bit is set when the attribute has the
/// `set_when` value; the opposite value and absence both leave it clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitFlag {
    pub attribute: &'static str,
    pub bit: u32,
    pub set_when: YesNo,
}

impl BitFlag {
    pub const fn new(attribute: &'static str, bit: u32, set_when: YesNo) -> Self {
        Self {
            attribute,
            bit,
            set_when,
        }
    }
}

/// Lookup table of bit flags for one column
#[derive(Debug, Clone, Copy)]
pub struct FlagSet {
    flags: &'static [BitFlag],
}

impl FlagSet {
    pub const fn new(flags: &'static [BitFlag]) -> Self {
        Self { flags }
    }

    pub fn flags(&self) -> &'static [BitFlag] {
        self.flags
    }

    /// Find the flag for an attribute name
    pub fn flag(&self, attribute: &str) -> Option<&'static BitFlag> {
        self.flags.iter().find(|f| f.attribute == attribute)
    }

    /// Combine attribute values into a bitmask. Unknown attributes are ignored.
    pub fn encode<'a>(&self, values: impl IntoIterator<Item = (&'a str, YesNo)>) -> u32 {
        values
            .into_iter()
            .filter_map(|(attribute, value)| {
                self.flag(attribute)
                    .filter(|flag| flag.set_when == value)
                    .map(|flag| flag.bit)
            })
            .fold(0, |bits, bit| bits | bit)
    }

    /// Attribute values that reproduce `bits`, in table order
    pub fn decode(&self, bits: u32) -> Vec<(&'static str, YesNo)> {
        self.flags
            .iter()
            .filter(|flag| bits & flag.bit != 0)
            .map(|flag| (flag.attribute, flag.set_when))
            .collect()
    }

    /// Bits not covered by any flag
    pub fn unknown_bits(&self, bits: u32) -> u32 {
        let known = self.flags.iter().fold(0, |mask, flag| mask | flag.bit);
        bits & !known
    }
}
