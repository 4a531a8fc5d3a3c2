//! Utility code for working with nucleotide sequences.

use serde::{Deserialize, Serialize};

pub use crate::sequences::error::Error;

mod error {
    /// Error type for sequence translation.
    #[derive(thiserror::Error, Debug, PartialEq)]
    pub enum Error {
        #[error("codon is undefined in codon table: {0}")]
        UndefinedCodon(String),
        #[error("can only translate DNA sequences whose length is multiple of 3, but is: {0}")]
        UntranslatableDnaLength(usize),
        #[error("reading frame must be 0, 1, or 2, but is: {0}")]
        InvalidFrame(u8),
    }
}

/// Reverse complementing shortcut.
pub fn revcomp(seq: &str) -> String {
    String::from_utf8_lossy(&bio::alphabets::dna::revcomp(seq.as_bytes())).into_owned()
}

/// Codons in the `TCAG` order of the NCBI genetic code tables.
const TCAG: &[u8; 4] = b"TCAG";

/// Standard genetic code (NCBI table 1) in `TCAG` order.
const STANDARD_AAS: &[u8; 64] =
    b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

lazy_static::lazy_static! {
    /// Mapping from DNA/RNA ASCII to 2-bit representation, 255 for other characters.
    static ref DNA_ASCII_TO_2BIT: [u8; 256] = {
        let mut result = [255; 256];

        for (value, chars) in [(0, b"Aa"), (1, b"Cc"), (2, b"Gg"), (3, b"Tt")] {
            for c in chars {
                result[*c as usize] = value;
            }
        }
        result[b'U' as usize] = 3;
        result[b'u' as usize] = 3;

        result
    };

    /// Mapping from 2-bit codon to amino acid 1-letter ASCII, standard table.
    static ref CODON_2BIT_TO_AA1_LUT: [u8; 64] = {
        let mut result = [0; 64];
        for (i, aa) in STANDARD_AAS.iter().enumerate() {
            let codon = [TCAG[i / 16], TCAG[(i / 4) % 4], TCAG[i % 4]];
            let idx = dna3_to_2bit(&codon).expect("should not happen; TCAG are valid bases");
            result[idx as usize] = *aa;
        }
        result
    };

    /// Standard table with `TGA` read as selenocysteine.
    static ref CODON_2BIT_TO_AA1_SEC: [u8; 64] = {
        let mut result = *CODON_2BIT_TO_AA1_LUT;
        let idx = dna3_to_2bit(b"TGA").expect("should not happen; TGA is a valid codon");
        result[idx as usize] = b'U';
        result
    };
}

static IUPAC_AMBIGUITY_CODES: &[u8] = b"BDHVNUWSMKRYZbdhvnuwsmkryz";

/// Bases of an IUPAC nucleotide code, `None` for other characters.
fn iupac_bases(c: u8) -> Option<&'static [u8]> {
    Some(match c.to_ascii_uppercase() {
        b'A' => b"A",
        b'C' => b"C",
        b'G' => b"G",
        b'T' | b'U' => b"T",
        b'R' => b"AG",
        b'Y' => b"CT",
        b'S' => b"CG",
        b'W' => b"AT",
        b'K' => b"GT",
        b'M' => b"AC",
        b'B' => b"CGT",
        b'D' => b"AGT",
        b'H' => b"ACT",
        b'V' => b"ACG",
        b'N' => b"ACGT",
        _ => return None,
    })
}

fn dna3_to_2bit(c: &[u8]) -> Option<u8> {
    let mut result = 0;
    for i in c.iter().take(3) {
        result <<= 2;
        let tmp = DNA_ASCII_TO_2BIT[*i as usize];
        if tmp == 255 {
            return None;
        }
        result |= tmp;
    }
    Some(result)
}

/// Allow selection of translation table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationTable {
    #[default]
    Standard,
    Selenocysteine,
}

/// Translation of single codons with a fixed table.
#[derive(Debug)]
pub struct CodonTranslator {
    /// Mapping from 2bit DNA codon to amino acid 1-letter ASCII.
    codon_2bit_to_aa1: &'static [u8; 64],
}

impl CodonTranslator {
    pub fn new(table: TranslationTable) -> Self {
        Self {
            codon_2bit_to_aa1: match table {
                TranslationTable::Standard => &CODON_2BIT_TO_AA1_LUT,
                TranslationTable::Selenocysteine => &CODON_2BIT_TO_AA1_SEC,
            },
        }
    }

    /// Translate the given codon to an amino acid.
    ///
    /// Degenerate codons translate to the amino acid all their expansions share, e.g.,
    /// `AAR` to `K`, and to `X` otherwise.
    pub fn translate(&self, codon: &[u8]) -> Result<u8, Error> {
        if let Some(val) = dna3_to_2bit(codon) {
            return Ok(self.codon_2bit_to_aa1[val as usize]);
        }
        if let Some(aa) = self.translate_degenerate(codon) {
            Ok(aa)
        } else if codon.iter().any(|c| IUPAC_AMBIGUITY_CODES.contains(c)) {
            Ok(b'X')
        } else {
            Err(Error::UndefinedCodon(
                String::from_utf8_lossy(codon).into_owned(),
            ))
        }
    }

    /// The single amino acid of all expansions of a degenerate codon, `b'X'` if they
    /// differ, `None` if the codon has non-IUPAC characters.
    fn translate_degenerate(&self, codon: &[u8]) -> Option<u8> {
        let [first, second, third] = codon else {
            return None;
        };
        let (first, second, third) = (
            iupac_bases(*first)?,
            iupac_bases(*second)?,
            iupac_bases(*third)?,
        );
        let mut result = None;
        for a in first {
            for b in second {
                for c in third {
                    let val = dna3_to_2bit(&[*a, *b, *c])?;
                    let aa = self.codon_2bit_to_aa1[val as usize];
                    match result {
                        None => result = Some(aa),
                        Some(prev) if prev != aa => return Some(b'X'),
                        Some(_) => (),
                    }
                }
            }
        }
        result
    }
}

/// Translates a DNA or RNA sequence into a single-letter amino acid sequence.
///
/// # Args
///
/// * `seq` -- A nucleotide sequence.
/// * `full_codons` -- If `true`, forces sequence to have length that is a multiple of 3
///    and return an `Err` otherwise.  If `false`, `ter_symbol` will be added as the last
///    amino acid.
/// * `ter_symbol` -- Placeholder for the last amino acid if sequence length is not divisible
///    by three and `full_codons` is `false`.
/// * `translation_table` -- Indicates which codon to amino acid translation table to use.
pub fn translate_cds(
    seq: &str,
    full_codons: bool,
    ter_symbol: &str,
    translation_table: TranslationTable,
) -> Result<String, Error> {
    if seq.is_empty() {
        return Ok("".to_string());
    }

    if full_codons && seq.len() % 3 != 0 {
        return Err(Error::UntranslatableDnaLength(seq.len()));
    }

    let translator = CodonTranslator::new(translation_table);
    let mut result = String::with_capacity(seq.len() / 3 + 1);
    for chunk in seq.as_bytes().chunks_exact(3) {
        result.push(char::from(translator.translate(chunk)?));
    }

    if !full_codons && seq.len() % 3 != 0 {
        result.push_str(ter_symbol);
    }

    Ok(result)
}

/// Translate a coding sequence starting at the given reading frame.
///
/// The first `frame` bases are skipped and an incomplete trailing codon is dropped.
pub fn translate_in_frame(
    seq: &str,
    frame: u8,
    translation_table: TranslationTable,
) -> Result<String, Error> {
    if frame > 2 {
        return Err(Error::InvalidFrame(frame));
    }
    let seq = seq.get(frame as usize..).unwrap_or("");
    let len = seq.len() - seq.len() % 3;
    translate_cds(&seq[..len], true, "*", translation_table)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn revcomp_cases() {
        assert_eq!(revcomp(""), "");
        assert_eq!(revcomp("A"), "T");
        assert_eq!(revcomp("AG"), "CT");
        assert_eq!(revcomp("CGAG"), "CTCG");
    }

    #[test]
    fn translate_cds_examples() -> Result<(), Error> {
        assert_eq!(
            translate_cds("ATGCGA", true, "*", TranslationTable::Standard)?,
            "MR"
        );
        assert_eq!(
            translate_cds("AUGCGA", true, "*", TranslationTable::Standard)?,
            "MR"
        );
        assert_eq!(
            translate_cds("", true, "*", TranslationTable::Standard)?,
            ""
        );
        assert!(translate_cds("AUGCG", true, "*", TranslationTable::Standard).is_err());
        assert_eq!(
            translate_cds("AUGCG", false, "*", TranslationTable::Standard)?,
            "M*"
        );
        assert_eq!(
            translate_cds("ATGTAN", true, "*", TranslationTable::Standard)?,
            "MX"
        );
        assert_eq!(
            translate_cds("atgtgg", true, "*", TranslationTable::Standard)?,
            "MW"
        );
        assert_eq!(
            translate_cds("TGATAA", true, "*", TranslationTable::Standard)?,
            "**"
        );
        assert_eq!(
            translate_cds("TGATAA", true, "*", TranslationTable::Selenocysteine)?,
            "U*"
        );
        assert!(translate_cds("AUGCGQ", true, "*", TranslationTable::Standard).is_err());

        Ok(())
    }

    #[test]
    fn translate_in_frame_examples() -> Result<(), Error> {
        let table = TranslationTable::Standard;
        assert_eq!(translate_in_frame("ATGGCTGAAAGCTGGATAAT", 0, table)?, "MAESWI");
        assert_eq!(translate_in_frame("CATGGCTGA", 1, table)?, "MA");
        assert_eq!(translate_in_frame("CCATGGCTTAA", 2, table)?, "MA*");
        assert_eq!(translate_in_frame("AT", 2, table)?, "");
        assert_eq!(translate_in_frame("ATGAAA", 3, table), Err(Error::InvalidFrame(3)));

        Ok(())
    }

    #[test]
    fn codon_translator_standard() -> Result<(), Error> {
        let translator = CodonTranslator::new(TranslationTable::Standard);

        assert_eq!(translator.translate(b"AAA")?, b'K');
        assert_eq!(translator.translate(b"GGG")?, b'G');
        assert_eq!(translator.translate(b"TTT")?, b'F');
        assert_eq!(translator.translate(b"ATG")?, b'M');
        assert_eq!(translator.translate(b"TAG")?, b'*');
        assert_eq!(translator.translate(b"AAR")?, b'K');
        assert_eq!(translator.translate(b"AAY")?, b'N');
        assert_eq!(translator.translate(b"GCN")?, b'A');
        assert_eq!(translator.translate(b"tar")?, b'*');
        assert_eq!(translator.translate(b"TRA")?, b'*');
        assert_eq!(translator.translate(b"AAN")?, b'X');
        assert_eq!(translator.translate(b"NNN")?, b'X');
        assert!(translator.translate(b"AAQ").is_err());

        Ok(())
    }

    #[test]
    fn codon_translator_sec() -> Result<(), Error> {
        let translator = CodonTranslator::new(TranslationTable::Selenocysteine);

        assert_eq!(translator.translate(b"AAR")?, b'K');
        assert_eq!(translator.translate(b"TGA")?, b'U');
        // TGA and TAA differ under selenocysteine
        assert_eq!(translator.translate(b"TRA")?, b'X');

        Ok(())
    }
}
