// Tag Vocabulary - controlled medicinal-property taxonomy
//
// Canonical tags grouped by physiological category, a phrase normalization
// table (many-to-one), and an ordered keyword heuristic table.
// Loaded once at process start and shared read-only behind an Arc.

use once_cell::sync::Lazy;
use phyto_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Version string of the embedded vocabulary
pub const BUILTIN_VOCABULARY_VERSION: &str = "2024.2";

/// Canonical tags by physiological category
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "immune-antimicrobial",
        &[
            "antibacterial",
            "antiviral",
            "antifungal",
            "antiparasitic",
            "anthelmintic",
            "antimicrobial",
            "antiseptic",
            "antiprotozoal",
            "antimalarial",
            "immunostimulant",
            "immunomodulator",
            "immune-support",
            "febrifuge",
            "diaphoretic",
            "alterative",
            "lymphatic",
        ],
    ),
    (
        "inflammation-pain",
        &[
            "anti-inflammatory",
            "analgesic",
            "anodyne",
            "antispasmodic",
            "anti-rheumatic",
            "anti-arthritic",
            "counterirritant",
            "anesthetic",
            "antipyretic",
            "anti-allergic",
            "antihistamine",
        ],
    ),
    (
        "digestive",
        &[
            "digestive",
            "carminative",
            "stomachic",
            "bitter",
            "cholagogue",
            "choleretic",
            "laxative",
            "purgative",
            "cathartic",
            "antidiarrheal",
            "antiemetic",
            "appetite-stimulant",
            "demulcent",
            "antacid",
            "gastroprotective",
            "emetic",
            "prebiotic",
            "anti-ulcer",
            "vermifuge",
        ],
    ),
    (
        "hepatic",
        &["hepatoprotective", "liver-tonic", "detoxifying", "depurative"],
    ),
    (
        "respiratory",
        &[
            "expectorant",
            "mucolytic",
            "antitussive",
            "decongestant",
            "bronchodilator",
            "respiratory-tonic",
            "pectoral",
            "anti-asthmatic",
            "anticatarrhal",
        ],
    ),
    (
        "cardiovascular",
        &[
            "cardiotonic",
            "hypotensive",
            "hypertensive",
            "vasodilator",
            "vasoconstrictor",
            "anticoagulant",
            "hemostatic",
            "circulatory-stimulant",
            "cholesterol-lowering",
            "antiarrhythmic",
            "venotonic",
            "styptic",
            "blood-tonic",
        ],
    ),
    (
        "nervous",
        &[
            "sedative",
            "nervine",
            "anxiolytic",
            "antidepressant",
            "adaptogen",
            "stimulant",
            "hypnotic",
            "relaxant",
            "nootropic",
            "neuroprotective",
            "anticonvulsant",
            "memory-enhancer",
            "sleep-aid",
            "calmative",
            "mood-enhancer",
            "psychoactive",
        ],
    ),
    (
        "metabolic-endocrine",
        &[
            "antidiabetic",
            "hypoglycemic",
            "thyroid-support",
            "hormone-balancing",
            "phytoestrogenic",
            "anti-obesity",
            "metabolic-stimulant",
            "antioxidant",
            "anti-aging",
        ],
    ),
    (
        "urinary",
        &[
            "diuretic",
            "urinary-antiseptic",
            "lithotriptic",
            "kidney-tonic",
            "aquaretic",
        ],
    ),
    (
        "reproductive",
        &[
            "emmenagogue",
            "galactagogue",
            "uterine-tonic",
            "aphrodisiac",
            "anaphrodisiac",
            "abortifacient",
            "fertility-support",
            "menstrual-support",
            "antigalactagogue",
            "prostate-support",
            "oxytocic",
        ],
    ),
    (
        "skin-topical",
        &[
            "vulnerary",
            "emollient",
            "astringent",
            "wound-healing",
            "rubefacient",
            "skin-soothing",
            "antipruritic",
            "anti-acne",
            "cicatrizant",
            "insect-repellent",
            "insecticidal",
            "hair-tonic",
            "vesicant",
        ],
    ),
    (
        "musculoskeletal",
        &[
            "muscle-relaxant",
            "bone-health",
            "joint-support",
            "anti-gout",
            "connective-tissue-support",
        ],
    ),
    (
        "cellular",
        &[
            "anticancer",
            "antitumor",
            "antimutagenic",
            "cytotoxic",
            "antiproliferative",
        ],
    ),
    (
        "general-tonic",
        &[
            "tonic",
            "nutritive",
            "restorative",
            "energizing",
            "anti-fatigue",
            "rejuvenative",
            "culinary",
            "edible",
            "aromatic",
            "pungent",
            "anti-scorbutic",
        ],
    ),
    (
        "sensory-oral",
        &[
            "ophthalmic",
            "oral-health",
            "antiodontalgic",
            "sialagogue",
            "otic",
        ],
    ),
    (
        "caution",
        &[
            "toxic",
            "poisonous",
            "allergenic",
            "photosensitizing",
            "hallucinogenic",
            "narcotic",
            "irritant",
            "hepatotoxic",
            "pregnancy-caution",
            "cardiotoxic",
        ],
    ),
];

/// Known phrase variants (lowercase, trimmed) → canonical tag
const NORMALIZATION_RULES: &[(&str, &str)] = &[
    // inflammation / pain
    ("anti inflammatory", "anti-inflammatory"),
    ("antiinflammatory", "anti-inflammatory"),
    ("anti-inflamatory", "anti-inflammatory"),
    ("reduces inflammation", "anti-inflammatory"),
    ("pain relief", "analgesic"),
    ("pain reliever", "analgesic"),
    ("painkiller", "analgesic"),
    ("anti-spasmodic", "antispasmodic"),
    ("anti spasmodic", "antispasmodic"),
    ("antirheumatic", "anti-rheumatic"),
    ("anti rheumatic", "anti-rheumatic"),
    ("arthritis", "anti-arthritic"),
    ("antiarthritic", "anti-arthritic"),
    ("anti-allergy", "anti-allergic"),
    ("antiallergic", "anti-allergic"),
    ("allergy relief", "anti-allergic"),
    ("anti-histamine", "antihistamine"),
    ("fever reducer", "antipyretic"),
    ("reduces fever", "antipyretic"),
    ("anti-pyretic", "antipyretic"),
    // antimicrobial
    ("anti-bacterial", "antibacterial"),
    ("anti bacterial", "antibacterial"),
    ("anti-viral", "antiviral"),
    ("anti viral", "antiviral"),
    ("anti-fungal", "antifungal"),
    ("anti fungal", "antifungal"),
    ("anti-microbial", "antimicrobial"),
    ("anti-septic", "antiseptic"),
    ("anti-parasitic", "antiparasitic"),
    ("dewormer", "anthelmintic"),
    ("anti-helminthic", "anthelmintic"),
    ("antihelminthic", "anthelmintic"),
    ("anti-malarial", "antimalarial"),
    ("anti malarial", "antimalarial"),
    ("immune boosting", "immunostimulant"),
    ("immune booster", "immunostimulant"),
    ("immunity", "immune-support"),
    // digestive / hepatic
    ("digestion", "digestive"),
    ("digestive aid", "digestive"),
    ("aids digestion", "digestive"),
    ("gas relief", "carminative"),
    ("bloating", "carminative"),
    ("constipation", "laxative"),
    ("diarrhea", "antidiarrheal"),
    ("anti-diarrheal", "antidiarrheal"),
    ("nausea", "antiemetic"),
    ("anti-emetic", "antiemetic"),
    ("antiulcer", "anti-ulcer"),
    ("liver tonic", "liver-tonic"),
    ("liver protection", "hepatoprotective"),
    ("detox", "detoxifying"),
    ("blood purifier", "depurative"),
    // respiratory
    ("cough", "antitussive"),
    ("cough suppressant", "antitussive"),
    ("anti-tussive", "antitussive"),
    ("congestion", "decongestant"),
    ("antiasthmatic", "anti-asthmatic"),
    ("asthma", "anti-asthmatic"),
    // cardiovascular
    ("lowers blood pressure", "hypotensive"),
    ("high blood pressure", "hypotensive"),
    ("anti-hypertensive", "hypotensive"),
    ("antihypertensive", "hypotensive"),
    ("heart tonic", "cardiotonic"),
    ("heart health", "cardiotonic"),
    ("blood thinner", "anticoagulant"),
    ("anti-coagulant", "anticoagulant"),
    ("stops bleeding", "hemostatic"),
    ("haemostatic", "hemostatic"),
    ("cholesterol", "cholesterol-lowering"),
    // nervous
    ("sleep", "sleep-aid"),
    ("insomnia", "sleep-aid"),
    ("anxiety", "anxiolytic"),
    ("anti-anxiety", "anxiolytic"),
    ("anti anxiety", "anxiolytic"),
    ("depression", "antidepressant"),
    ("anti-depressant", "antidepressant"),
    ("stress", "adaptogen"),
    ("adaptogenic", "adaptogen"),
    ("anti-convulsant", "anticonvulsant"),
    ("anti-epileptic", "anticonvulsant"),
    ("antiepileptic", "anticonvulsant"),
    ("memory", "memory-enhancer"),
    ("cognitive", "nootropic"),
    ("calming", "calmative"),
    ("relaxing", "relaxant"),
    ("energy", "energizing"),
    // metabolic
    ("anti-oxidant", "antioxidant"),
    ("anti oxidant", "antioxidant"),
    ("anti-diabetic", "antidiabetic"),
    ("blood sugar", "hypoglycemic"),
    ("antiaging", "anti-aging"),
    ("anti ageing", "anti-aging"),
    ("anti-ageing", "anti-aging"),
    ("weight loss", "anti-obesity"),
    // reproductive
    ("menstrual cramps", "menstrual-support"),
    ("lactation", "galactagogue"),
    ("milk production", "galactagogue"),
    ("libido", "aphrodisiac"),
    // skin
    ("wound healing", "wound-healing"),
    ("heals wounds", "wound-healing"),
    ("skin care", "skin-soothing"),
    ("sunburn", "skin-soothing"),
    ("itch relief", "antipruritic"),
    ("anti-itch", "antipruritic"),
    ("acne", "anti-acne"),
    ("insect repellant", "insect-repellent"),
    ("mosquito repellent", "insect-repellent"),
    ("bug repellent", "insect-repellent"),
    // musculoskeletal / general
    ("gout", "anti-gout"),
    ("fatigue", "anti-fatigue"),
    ("antiscorbutic", "anti-scorbutic"),
    ("scurvy", "anti-scorbutic"),
    ("anti-cancer", "anticancer"),
    ("anti cancer", "anticancer"),
    ("anti-tumor", "antitumor"),
    ("anti-tumour", "antitumor"),
    ("antitumour", "antitumor"),
    // caution
    ("poison", "poisonous"),
    ("toxicity", "toxic"),
];

/// Ordered substring heuristics; the first keyword found wins
const KEYWORD_HEURISTICS: &[(&str, &str)] = &[
    ("inflam", "anti-inflammatory"),
    ("detox", "detoxifying"),
    ("toxic", "toxic"),
    ("poison", "poisonous"),
    ("pain", "analgesic"),
    ("bacteri", "antibacterial"),
    ("viral", "antiviral"),
    ("virus", "antiviral"),
    ("fung", "antifungal"),
    ("microb", "antimicrobial"),
    ("septic", "antiseptic"),
    ("parasit", "antiparasitic"),
    ("helminth", "anthelmintic"),
    ("worm", "anthelmintic"),
    ("malaria", "antimalarial"),
    ("immun", "immune-support"),
    ("fever", "antipyretic"),
    ("pyret", "antipyretic"),
    ("rheumat", "anti-rheumatic"),
    ("arthrit", "anti-arthritic"),
    ("allerg", "anti-allergic"),
    ("histamin", "antihistamine"),
    ("cramp", "antispasmodic"),
    ("spasm", "antispasmodic"),
    ("digest", "digestive"),
    ("constipat", "laxative"),
    ("laxat", "laxative"),
    ("diarrh", "antidiarrheal"),
    ("nause", "antiemetic"),
    ("vomit", "antiemetic"),
    ("ulcer", "anti-ulcer"),
    ("liver", "hepatoprotective"),
    ("hepat", "hepatoprotective"),
    ("cough", "antitussive"),
    ("mucus", "mucolytic"),
    ("congest", "decongestant"),
    ("asthma", "anti-asthmatic"),
    ("bronch", "bronchodilator"),
    ("blood pressure", "hypotensive"),
    ("hypertens", "hypotensive"),
    ("cholesterol", "cholesterol-lowering"),
    ("coagul", "anticoagulant"),
    ("bleed", "hemostatic"),
    ("heart", "cardiotonic"),
    ("cardi", "cardiotonic"),
    ("sleep", "sleep-aid"),
    ("insomn", "sleep-aid"),
    ("anxi", "anxiolytic"),
    ("depress", "antidepressant"),
    ("stress", "adaptogen"),
    ("sedat", "sedative"),
    ("calm", "calmative"),
    ("relax", "relaxant"),
    ("convuls", "anticonvulsant"),
    ("seizure", "anticonvulsant"),
    ("epilep", "anticonvulsant"),
    ("memory", "memory-enhancer"),
    ("cognit", "nootropic"),
    ("nerv", "nervine"),
    ("diabet", "antidiabetic"),
    ("glucose", "hypoglycemic"),
    ("sugar", "hypoglycemic"),
    ("oxida", "antioxidant"),
    ("thyroid", "thyroid-support"),
    ("hormon", "hormone-balancing"),
    ("estrogen", "phytoestrogenic"),
    ("weight", "anti-obesity"),
    ("aging", "anti-aging"),
    ("ageing", "anti-aging"),
    ("urin", "diuretic"),
    ("diuret", "diuretic"),
    ("kidney", "kidney-tonic"),
    ("menstru", "menstrual-support"),
    ("lactat", "galactagogue"),
    ("libido", "aphrodisiac"),
    ("wound", "wound-healing"),
    ("itch", "antipruritic"),
    ("acne", "anti-acne"),
    ("skin", "skin-soothing"),
    ("insect", "insect-repellent"),
    ("mosquito", "insect-repellent"),
    ("muscle", "muscle-relaxant"),
    ("bone", "bone-health"),
    ("joint", "joint-support"),
    ("gout", "anti-gout"),
    ("cancer", "anticancer"),
    ("tumo", "antitumor"),
    ("fatigue", "anti-fatigue"),
    ("energ", "energizing"),
    ("ophthalm", "ophthalmic"),
    ("tooth", "antiodontalgic"),
    ("dental", "oral-health"),
    ("stimul", "stimulant"),
    ("tonic", "tonic"),
];

/// One substring heuristic: if `keyword` occurs in the cleaned raw tag, emit `tag`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,
    pub tag: String,
}

/// On-disk vocabulary override format (TOML)
///
/// ```toml
/// version = "local-1"
///
/// [categories]
/// digestive = ["carminative", "laxative"]
///
/// [rules]
/// "gas relief" = "carminative"
///
/// [[keywords]]
/// keyword = "constipat"
/// tag = "laxative"
/// ```
#[derive(Debug, Clone, Deserialize)]
struct VocabularyFile {
    version: String,
    categories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    rules: BTreeMap<String, String>,
    #[serde(default)]
    keywords: Vec<KeywordRule>,
}

/// Controlled tag vocabulary: canonical set, normalization rules, keyword heuristics
#[derive(Debug, Clone)]
pub struct TagVocabulary {
    version: String,
    /// canonical tag → physiological category
    canonical: HashMap<String, String>,
    /// cleaned raw phrase → canonical tag
    rules: HashMap<String, String>,
    keywords: Vec<KeywordRule>,
}

static BUILTIN: Lazy<Arc<TagVocabulary>> = Lazy::new(|| {
    Arc::new(TagVocabulary::from_parts(
        BUILTIN_VOCABULARY_VERSION.to_string(),
        CATEGORIES
            .iter()
            .map(|(category, tags)| {
                (
                    category.to_string(),
                    tags.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect(),
        NORMALIZATION_RULES
            .iter()
            .map(|(raw, tag)| (raw.to_string(), tag.to_string()))
            .collect(),
        KEYWORD_HEURISTICS
            .iter()
            .map(|(keyword, tag)| KeywordRule {
                keyword: keyword.to_string(),
                tag: tag.to_string(),
            })
            .collect(),
    ))
});

impl TagVocabulary {
    /// Build a validated vocabulary
    ///
    /// Canonical tags, rule keys, keywords and every target are normalized
    /// (trimmed, lowercased). Every rule target and keyword target must be a
    /// canonical tag. A tag listed under two categories is rejected, as are two
    /// rule keys that normalize to the same phrase but map to different tags.
    pub fn new(
        version: impl Into<String>,
        categories: Vec<(String, Vec<String>)>,
        rules: Vec<(String, String)>,
        keywords: Vec<KeywordRule>,
    ) -> Result<Self> {
        let mut owner: HashMap<String, String> = HashMap::new();
        let mut cleaned_categories = Vec::with_capacity(categories.len());
        for (category, tags) in categories {
            let category = category.trim().to_lowercase();
            let mut cleaned_tags = Vec::with_capacity(tags.len());
            for tag in tags {
                let tag = tag.trim().to_lowercase();
                if tag.is_empty() {
                    return Err(Error::Vocabulary(format!(
                        "Empty tag in category '{}'",
                        category
                    )));
                }
                match owner.get(&tag) {
                    Some(existing) if existing != &category => {
                        return Err(Error::Vocabulary(format!(
                            "Tag '{}' listed under both '{}' and '{}'",
                            tag, existing, category
                        )));
                    }
                    Some(_) => continue,
                    None => {
                        owner.insert(tag.clone(), category.clone());
                        cleaned_tags.push(tag);
                    }
                }
            }
            cleaned_categories.push((category, cleaned_tags));
        }
        let vocabulary =
            Self::from_parts(version.into(), cleaned_categories, Vec::new(), Vec::new());

        let mut normalized: HashMap<String, String> = HashMap::new();
        for (raw, tag) in rules {
            let tag = tag.trim().to_lowercase();
            let key = raw.trim().to_lowercase();
            if key.is_empty() {
                return Err(Error::Vocabulary("Normalization rule with empty phrase".to_string()));
            }
            if !vocabulary.contains(&tag) {
                return Err(Error::Vocabulary(format!(
                    "Normalization rule '{}' targets unknown tag '{}'",
                    key, tag
                )));
            }
            if let Some(existing) = normalized.get(&key) {
                if existing != &tag {
                    return Err(Error::Vocabulary(format!(
                        "Normalization rule '{}' maps to both '{}' and '{}'",
                        key, existing, tag
                    )));
                }
            }
            normalized.insert(key, tag);
        }

        let mut checked = Vec::with_capacity(keywords.len());
        for rule in keywords {
            let keyword = rule.keyword.trim().to_lowercase();
            let tag = rule.tag.trim().to_lowercase();
            if keyword.is_empty() {
                return Err(Error::Vocabulary("Keyword heuristic with empty keyword".to_string()));
            }
            if !vocabulary.contains(&tag) {
                return Err(Error::Vocabulary(format!(
                    "Keyword '{}' targets unknown tag '{}'",
                    keyword, tag
                )));
            }
            checked.push(KeywordRule { keyword, tag });
        }

        Ok(Self {
            rules: normalized,
            keywords: checked,
            ..vocabulary
        })
    }

    fn from_parts(
        version: String,
        categories: Vec<(String, Vec<String>)>,
        rules: Vec<(String, String)>,
        keywords: Vec<KeywordRule>,
    ) -> Self {
        let mut canonical = HashMap::new();
        for (category, tags) in categories {
            for tag in tags {
                canonical.insert(tag, category.clone());
            }
        }

        Self {
            version,
            canonical,
            rules: rules.into_iter().collect(),
            keywords,
        }
    }

    /// Shared embedded vocabulary
    pub fn builtin() -> Arc<TagVocabulary> {
        Arc::clone(&BUILTIN)
    }

    /// Parse a vocabulary override from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: VocabularyFile = toml::from_str(content)
            .map_err(|e| Error::Vocabulary(format!("Parse vocabulary failed: {}", e)))?;

        Self::new(
            file.version,
            file.categories.into_iter().collect(),
            file.rules.into_iter().collect(),
            file.keywords,
        )
    }

    /// Load a vocabulary override file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Vocabulary(format!("Read vocabulary {} failed: {}", path.display(), e))
        })?;
        let vocabulary = Self::from_toml_str(&content)?;

        info!(
            version = %vocabulary.version,
            tags = vocabulary.len(),
            rules = vocabulary.rules.len(),
            keywords = vocabulary.keywords.len(),
            "Loaded tag vocabulary from {}",
            path.display()
        );
        Ok(vocabulary)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Number of canonical tags
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    /// Is `tag` a member of the canonical vocabulary
    pub fn contains(&self, tag: &str) -> bool {
        self.canonical.contains_key(tag)
    }

    /// Physiological category of a canonical tag
    pub fn category_of(&self, tag: &str) -> Option<&str> {
        self.canonical.get(tag).map(String::as_str)
    }

    /// Exact normalization lookup; `cleaned` must already be trimmed and lowercased
    pub fn normalize(&self, cleaned: &str) -> Option<&str> {
        self.rules.get(cleaned).map(String::as_str)
    }

    /// Keyword heuristics in table order
    pub fn keywords(&self) -> &[KeywordRule] {
        &self.keywords
    }

    /// All categories with their tags, sorted for stable output
    pub fn categories(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (tag, category) in &self.canonical {
            grouped.entry(category.as_str()).or_default().push(tag.as_str());
        }
        for tags in grouped.values_mut() {
            tags.sort_unstable();
        }
        grouped
    }
}
