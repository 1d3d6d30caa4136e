use phf::{Map, phf_map};

/// The twenty standard amino acids in one-letter code, alphabetical.
pub const STANDARD_AMINO_ACIDS: &str = "ACDEFGHIKLMNPQRSTVWY";

static THREE_TO_ONE: Map<&'static str, char> = phf_map! {
    "ALA" => 'A', "ARG" => 'R', "ASN" => 'N', "ASP" => 'D', "CYS" => 'C',
    "GLN" => 'Q', "GLU" => 'E', "GLY" => 'G', "HIS" => 'H', "ILE" => 'I',
    "LEU" => 'L', "LYS" => 'K', "MET" => 'M', "PHE" => 'F', "PRO" => 'P',
    "SER" => 'S', "THR" => 'T', "TRP" => 'W', "TYR" => 'Y', "VAL" => 'V',
    // Common protonation-state and modified-residue aliases.
    "HSD" => 'H', "HSE" => 'H', "HSP" => 'H', "HID" => 'H', "HIE" => 'H', "HIP" => 'H',
    "CYX" => 'C', "MSE" => 'M',
};

static ONE_TO_THREE: Map<char, &'static str> = phf_map! {
    'A' => "ALA", 'R' => "ARG", 'N' => "ASN", 'D' => "ASP", 'C' => "CYS",
    'Q' => "GLN", 'E' => "GLU", 'G' => "GLY", 'H' => "HIS", 'I' => "ILE",
    'L' => "LEU", 'K' => "LYS", 'M' => "MET", 'F' => "PHE", 'P' => "PRO",
    'S' => "SER", 'T' => "THR", 'W' => "TRP", 'Y' => "TYR", 'V' => "VAL",
};

/// One-letter code for a three-letter residue name, if it is a standard residue.
pub fn three_to_one(res_name: &str) -> Option<char> {
    THREE_TO_ONE.get(res_name.trim().to_ascii_uppercase().as_str()).copied()
}

pub fn one_to_three(code: char) -> Option<&'static str> {
    ONE_TO_THREE.get(&code.to_ascii_uppercase()).copied()
}

pub fn is_standard(code: char) -> bool {
    STANDARD_AMINO_ACIDS.contains(code.to_ascii_uppercase())
}

/// Standard residues remaining after removing a disallowed set, in alphabetical order.
pub fn allowed_alphabet(disallowed: &[char]) -> Vec<char> {
    STANDARD_AMINO_ACIDS
        .chars()
        .filter(|c| !disallowed.iter().any(|d| d.eq_ignore_ascii_case(c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_letter_mapping_covers_aliases() {
        assert_eq!(three_to_one("TRP"), Some('W'));
        assert_eq!(three_to_one("hsd"), Some('H'));
        assert_eq!(three_to_one("HOH"), None);
    }

    #[test]
    fn mappings_are_inverse_for_standard_residues() {
        for code in STANDARD_AMINO_ACIDS.chars() {
            let three = one_to_three(code).unwrap();
            assert_eq!(three_to_one(three), Some(code));
        }
    }

    #[test]
    fn allowed_alphabet_removes_disallowed_case_insensitively() {
        let alphabet = allowed_alphabet(&['c', 'M']);
        assert_eq!(alphabet.len(), 18);
        assert!(!alphabet.contains(&'C'));
        assert!(!alphabet.contains(&'M'));
    }
}
