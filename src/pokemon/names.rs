/// Names whose identifier does not survive the generic rule.
const NAME_OVERRIDES: &[(&str, &str)] = &[
    ("mr-mime", "Mr. Mime"),
    ("mr-mime-galar", "Mr. Mime"),
    ("mr-rime", "Mr. Rime"),
    ("mime-jr", "Mime Jr."),
    ("nidoran-f", "Nidoran♀"),
    ("nidoran-m", "Nidoran♂"),
    ("farfetchd", "Farfetch'd"),
    ("farfetchd-galar", "Farfetch'd"),
    ("sirfetchd", "Sirfetch'd"),
    ("ho-oh", "Ho-Oh"),
    ("porygon-z", "Porygon-Z"),
    ("jangmo-o", "Jangmo-o"),
    ("hakamo-o", "Hakamo-o"),
    ("kommo-o", "Kommo-o"),
    ("type-null", "Type: Null"),
    ("tapu-koko", "Tapu Koko"),
    ("tapu-lele", "Tapu Lele"),
    ("tapu-bulu", "Tapu Bulu"),
    ("tapu-fini", "Tapu Fini"),
    ("flabebe", "Flabébé"),
    ("great-tusk", "Great Tusk"),
    ("scream-tail", "Scream Tail"),
    ("brute-bonnet", "Brute Bonnet"),
    ("flutter-mane", "Flutter Mane"),
    ("slither-wing", "Slither Wing"),
    ("sandy-shocks", "Sandy Shocks"),
    ("iron-treads", "Iron Treads"),
    ("iron-bundle", "Iron Bundle"),
    ("iron-hands", "Iron Hands"),
    ("iron-jugulis", "Iron Jugulis"),
    ("iron-moth", "Iron Moth"),
    ("iron-thorns", "Iron Thorns"),
    ("iron-valiant", "Iron Valiant"),
    ("roaring-moon", "Roaring Moon"),
    ("walking-wake", "Walking Wake"),
    ("iron-leaves", "Iron Leaves"),
    ("gouging-fire", "Gouging Fire"),
    ("raging-bolt", "Raging Bolt"),
    ("iron-boulder", "Iron Boulder"),
    ("iron-crown", "Iron Crown"),
    ("wo-chien", "Wo-Chien"),
    ("chien-pao", "Chien-Pao"),
    ("ting-lu", "Ting-Lu"),
    ("chi-yu", "Chi-Yu"),
];

/// Maps a raw identifier such as `charizard-mega-x` to the species display
/// name (`Charizard`). Form suffixes are dropped so forms of one species
/// compare equal.
pub fn display_name(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();

    if let Some((_, name)) = NAME_OVERRIDES.iter().find(|(id, _)| *id == lowered) {
        return name.to_string();
    }

    // Forms of an overridden species, e.g. `tapu-koko-totem`.
    if let Some((_, name)) = NAME_OVERRIDES
        .iter()
        .find(|(id, _)| lowered.starts_with(&format!("{}-", id)))
    {
        return name.to_string();
    }

    let base = lowered.split('-').next().unwrap_or_default();
    capitalize(base)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
