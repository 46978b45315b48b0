//! Built-in presets offered next to the input editor.

use crate::domain::Preset;

pub const DEFAULT_PRESET_ID: &str = "word-count";

const WORD_COUNT_DATA: &str = "Apple Banana Apple\nBanana Cherry Apple\nCherry Date Date";
const SALES_AGG_DATA: &str = "North 100\nSouth 200\nNorth 150\nEast 300\nSouth 50";

pub fn presets() -> Vec<Preset> {
    vec![word_count(), sales_aggregation()]
}

pub fn find_preset(id: &str) -> Option<Preset> {
    presets().into_iter().find(|preset| preset.id == id)
}

pub fn default_preset() -> Preset {
    word_count()
}

fn word_count() -> Preset {
    Preset {
        id: DEFAULT_PRESET_ID.into(),
        name: "Word Count".into(),
        description: "The \"Hello World\" of Hadoop: count how often each word appears.".into(),
        data: WORD_COUNT_DATA.into(),
    }
}

fn sales_aggregation() -> Preset {
    Preset {
        id: "sales-agg".into(),
        name: "Sales Aggregation".into(),
        description: "Total the sales figures per region.".into(),
        data: SALES_AGG_DATA.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_is_in_catalog() {
        assert_eq!(find_preset(DEFAULT_PRESET_ID), Some(default_preset()));
    }

    #[test]
    fn preset_ids_are_unique() {
        let presets = presets();
        for (i, a) in presets.iter().enumerate() {
            assert!(presets[i + 1..].iter().all(|b| b.id != a.id));
        }
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(find_preset("log-analysis").is_none());
    }
}
