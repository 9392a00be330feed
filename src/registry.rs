use crate::localize::localize;

/// Metadata a card advertises to the dashboard host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardInfo {
    pub card_type: &'static str,
    pub name: String,
    pub description: String,
    pub preview: bool,
}

impl CardInfo {
    pub fn megadesk() -> Self {
        Self {
            card_type: "megadesk-card",
            name: localize("common.name"),
            description: localize("common.description"),
            preview: true,
        }
    }
}

/// Host-wide card registry. Registration happens exactly once, explicitly,
/// from the entry point rather than as a module-load side effect.
#[derive(Debug, Default)]
pub struct CardRegistry {
    cards: Vec<CardInfo>,
}

impl CardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, info: CardInfo) {
        if self.lookup(info.card_type).is_some() {
            log::warn!("card type {:?} registered twice, ignoring", info.card_type);
            return;
        }
        log::info!("registered card {:?} ({})", info.card_type, info.name);
        self.cards.push(info);
    }

    pub fn lookup(&self, card_type: &str) -> Option<&CardInfo> {
        self.cards.iter().find(|card| card.card_type == card_type)
    }

    pub fn cards(&self) -> &[CardInfo] {
        &self.cards
    }
}
