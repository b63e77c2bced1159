//! Element column resolution
//!
//! Picks the chemical element columns out of a dataset header by
//! intersecting it with the canonical element symbols. Matching is
//! case-sensitive (`Co` is cobalt, `CO` is not an element column).

use std::collections::BTreeSet;

/// Canonical element symbols, ordered by atomic number
pub const ELEMENT_SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh",
    "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Whether `name` is a canonical element symbol
pub fn is_element(name: &str) -> bool {
    ELEMENT_SYMBOLS.contains(&name)
}

/// Element symbols present in `candidates`, deduplicated and sorted ascending
pub fn resolve_elements<S: AsRef<str>>(candidates: &[S]) -> Vec<String> {
    candidates
        .iter()
        .map(|c| c.as_ref())
        .filter(|c| is_element(c))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
