use std::collections::HashMap;

/// Static description and ordered remedy list for one disease class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemedyEntry {
    pub label: &'static str,
    pub description: &'static str,
    pub remedies: &'static [&'static str],
}

const ENTRIES: &[RemedyEntry] = &[
    RemedyEntry {
        label: "Pepper__bell___Bacterial_spot",
        description: "Bacterial disease causing dark, water-soaked spots on pepper leaves.",
        remedies: &[
            "Remove infected leaves",
            "Avoid overhead watering",
            "Use copper-based bactericides",
        ],
    },
    RemedyEntry {
        label: "Pepper__bell___healthy",
        description: "Healthy pepper plant",
        remedies: &["No action needed"],
    },
    RemedyEntry {
        label: "Potato___Early_blight",
        description: "Fungal disease causing concentric dark spots on leaves.",
        remedies: &[
            "Remove infected leaves",
            "Apply recommended fungicides",
            "Practice crop rotation",
        ],
    },
    RemedyEntry {
        label: "Potato___Late_blight",
        description: "Serious fungal disease affecting leaves and tubers.",
        remedies: &[
            "Destroy infected plants",
            "Avoid excess moisture",
            "Use certified disease-free seeds",
        ],
    },
    RemedyEntry {
        label: "Potato___healthy",
        description: "Healthy potato plant",
        remedies: &["No action needed"],
    },
    RemedyEntry {
        label: "Tomato_Bacterial_spot",
        description: "Bacterial disease causing small dark leaf spots.",
        remedies: &[
            "Remove infected leaves",
            "Apply copper-based sprays",
            "Avoid overhead irrigation",
        ],
    },
    RemedyEntry {
        label: "Tomato_Early_blight",
        description: "Fungal disease with dark concentric rings.",
        remedies: &[
            "Apply fungicide",
            "Remove affected leaves",
            "Mulch soil to prevent splash",
        ],
    },
    RemedyEntry {
        label: "Tomato_Late_blight",
        description: "Severe fungal disease causing brown lesions.",
        remedies: &[
            "Remove infected plants immediately",
            "Use fungicides",
            "Avoid wet foliage",
        ],
    },
    RemedyEntry {
        label: "Tomato_Leaf_Mold",
        description: "Yellow spots and mold growth under leaves.",
        remedies: &["Improve ventilation", "Reduce humidity", "Apply fungicides"],
    },
    RemedyEntry {
        label: "Tomato_Septoria_leaf_spot",
        description: "Fungal disease with gray spots and dark borders.",
        remedies: &[
            "Remove infected leaves",
            "Apply fungicide",
            "Avoid overhead watering",
        ],
    },
    RemedyEntry {
        label: "Tomato_Spider_mites_Two_spotted_spider_mite",
        description: "Pest infestation causing yellow speckling.",
        remedies: &[
            "Use neem oil",
            "Increase humidity",
            "Introduce natural predators",
        ],
    },
    RemedyEntry {
        label: "Tomato__Target_Spot",
        description: "Brown spots with concentric rings.",
        remedies: &["Remove affected leaves", "Apply fungicide", "Improve airflow"],
    },
    RemedyEntry {
        label: "Tomato__Tomato_YellowLeaf__Curl_Virus",
        description: "Viral disease causing yellowing and curling.",
        remedies: &[
            "Remove infected plants",
            "Control whiteflies",
            "Use resistant varieties",
        ],
    },
    RemedyEntry {
        label: "Tomato__Tomato_mosaic_virus",
        description: "Virus causing mosaic patterns on leaves.",
        remedies: &[
            "Destroy infected plants",
            "Disinfect tools",
            "Avoid handling wet plants",
        ],
    },
    RemedyEntry {
        label: "Tomato_healthy",
        description: "Healthy tomato plant",
        remedies: &["No action needed"],
    },
];

/// Label-keyed lookup over the static remedy entries. Built once at startup,
/// never mutated.
#[derive(Debug)]
pub struct RemedyTable {
    index: HashMap<&'static str, &'static RemedyEntry>,
}

impl RemedyTable {
    pub fn new() -> Self {
        let index = ENTRIES.iter().map(|entry| (entry.label, entry)).collect();
        Self { index }
    }

    pub fn lookup(&self, label: &str) -> Option<&'static RemedyEntry> {
        self.index.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl Default for RemedyTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_entry_has_description_and_remedies() {
        let table = RemedyTable::new();

        for entry in ENTRIES {
            let found = table.lookup(entry.label).unwrap();
            assert!(!found.description.is_empty(), "{}", entry.label);
            assert!(!found.remedies.is_empty(), "{}", entry.label);
            assert!(found.remedies.iter().all(|r| !r.is_empty()));
        }
    }

    #[test]
    fn test_absent_label_is_none() {
        let table = RemedyTable::new();

        assert!(table.lookup("Corn_common_rust").is_none());
        assert!(table.lookup("").is_none());
    }

    #[test]
    fn test_late_blight_entry() {
        let table = RemedyTable::new();
        let entry = table.lookup("Tomato_Late_blight").unwrap();

        assert_eq!(
            entry.description,
            "Severe fungal disease causing brown lesions."
        );
        assert_eq!(
            entry.remedies,
            &[
                "Remove infected plants immediately",
                "Use fungicides",
                "Avoid wet foliage"
            ]
        );
    }

    #[test]
    fn test_covers_all_fifteen_classes() {
        let table = RemedyTable::new();

        assert_eq!(table.len(), 15);
    }
}
