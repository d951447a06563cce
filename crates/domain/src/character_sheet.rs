//! Character sheet document.
//!
//! The sheet is a nested record of mostly string leaves. The engine never
//! interprets rule semantics; it only replaces fields addressed by dot paths
//! (see [`crate::sheet`]). Every struct deserializes with defaults so a partial
//! document (for example one produced by a model from an uploaded file) still
//! yields a complete sheet.
//!
//! List-like data such as inventory or languages is stored as one delimited
//! string, not as an array, so it can be replaced through a single path.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Character Sheet
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterSheet {
    pub core_identity: CoreIdentity,
    pub stats: Stats,
    pub combat: Combat,
    pub attacks_spellcasting: AttacksSpellcasting,
    pub features_traits: FeaturesTraits,
    pub equipment: Equipment,
    pub character_details: CharacterDetails,
}

impl CharacterSheet {
    pub fn character_name(&self) -> &str {
        &self.core_identity.character_name
    }
}

// =============================================================================
// Identity
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreIdentity {
    pub character_name: String,
    pub background: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub level: String,
    pub xp: String,
    pub species: String,
    pub subclass: String,
    pub alignment: String,
    pub player_name: String,
}

impl Default for CoreIdentity {
    fn default() -> Self {
        Self {
            character_name: String::new(),
            background: String::new(),
            class_name: String::new(),
            level: "1".to_string(),
            xp: "0".to_string(),
            species: String::new(),
            subclass: String::new(),
            alignment: String::new(),
            player_name: String::new(),
        }
    }
}

// =============================================================================
// Stats
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub abilities: Abilities,
    pub proficiency_bonus: String,
    pub saving_throws: SavingThrows,
    pub skills: Skills,
    pub passive_perception: String,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            abilities: Abilities::default(),
            proficiency_bonus: "+2".to_string(),
            saving_throws: SavingThrows::default(),
            skills: Skills::default(),
            passive_perception: "10".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Abilities {
    pub strength: String,
    pub dexterity: String,
    pub constitution: String,
    pub intelligence: String,
    pub wisdom: String,
    pub charisma: String,
}

impl Default for Abilities {
    fn default() -> Self {
        let ten = || "10".to_string();
        Self {
            strength: ten(),
            dexterity: ten(),
            constitution: ten(),
            intelligence: ten(),
            wisdom: ten(),
            charisma: ten(),
        }
    }
}

impl Abilities {
    pub fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("strength", &self.strength),
            ("dexterity", &self.dexterity),
            ("constitution", &self.constitution),
            ("intelligence", &self.intelligence),
            ("wisdom", &self.wisdom),
            ("charisma", &self.charisma),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Proficiency {
    pub proficient: bool,
}

impl Proficiency {
    pub const fn proficient() -> Self {
        Self { proficient: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavingThrows {
    pub strength: Proficiency,
    pub dexterity: Proficiency,
    pub constitution: Proficiency,
    pub intelligence: Proficiency,
    pub wisdom: Proficiency,
    pub charisma: Proficiency,
}

impl SavingThrows {
    pub fn entries(&self) -> [(&'static str, Proficiency); 6] {
        [
            ("strength", self.strength),
            ("dexterity", self.dexterity),
            ("constitution", self.constitution),
            ("intelligence", self.intelligence),
            ("wisdom", self.wisdom),
            ("charisma", self.charisma),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Skills {
    pub acrobatics: Proficiency,
    pub animal_handling: Proficiency,
    pub arcana: Proficiency,
    pub athletics: Proficiency,
    pub deception: Proficiency,
    pub history: Proficiency,
    pub insight: Proficiency,
    pub intimidation: Proficiency,
    pub investigation: Proficiency,
    pub medicine: Proficiency,
    pub nature: Proficiency,
    pub perception: Proficiency,
    pub performance: Proficiency,
    pub persuasion: Proficiency,
    pub religion: Proficiency,
    pub sleight_of_hand: Proficiency,
    pub stealth: Proficiency,
    pub survival: Proficiency,
}

impl Skills {
    /// Skills keyed by their serialized (camelCase) names, in sheet order.
    pub fn entries(&self) -> [(&'static str, Proficiency); 18] {
        [
            ("acrobatics", self.acrobatics),
            ("animalHandling", self.animal_handling),
            ("arcana", self.arcana),
            ("athletics", self.athletics),
            ("deception", self.deception),
            ("history", self.history),
            ("insight", self.insight),
            ("intimidation", self.intimidation),
            ("investigation", self.investigation),
            ("medicine", self.medicine),
            ("nature", self.nature),
            ("perception", self.perception),
            ("performance", self.performance),
            ("persuasion", self.persuasion),
            ("religion", self.religion),
            ("sleightOfHand", self.sleight_of_hand),
            ("stealth", self.stealth),
            ("survival", self.survival),
        ]
    }
}

// =============================================================================
// Combat
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Combat {
    pub armor_class: String,
    pub shield: String,
    pub initiative: String,
    pub speed: String,
    pub hit_points: HitPoints,
    pub hit_dice: HitDice,
    pub death_saves: DeathSaves,
    pub heroic_inspiration: String,
}

impl Default for Combat {
    fn default() -> Self {
        Self {
            armor_class: "10".to_string(),
            shield: String::new(),
            initiative: "0".to_string(),
            speed: "30ft".to_string(),
            hit_points: HitPoints::default(),
            hit_dice: HitDice::default(),
            death_saves: DeathSaves::default(),
            heroic_inspiration: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitPoints {
    pub max: String,
    pub current: String,
    pub temporary: String,
}

impl Default for HitPoints {
    fn default() -> Self {
        Self {
            max: "10".to_string(),
            current: "10".to_string(),
            temporary: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitDice {
    pub max: String,
    pub spent: String,
}

impl Default for HitDice {
    fn default() -> Self {
        Self {
            max: "1d8".to_string(),
            spent: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathSaves {
    pub successes: u8,
    pub failures: u8,
}

// =============================================================================
// Attacks & Spellcasting
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttacksSpellcasting {
    pub attacks: Vec<Attack>,
    pub spellcasting: Spellcasting,
    /// Keyed by spell level ("1" through "9").
    pub spell_slots: BTreeMap<String, SpellSlot>,
    pub spells: String,
}

impl Default for AttacksSpellcasting {
    fn default() -> Self {
        Self {
            attacks: vec![Attack::default(); 4],
            spellcasting: Spellcasting::default(),
            spell_slots: (1..=9)
                .map(|level| (level.to_string(), SpellSlot::default()))
                .collect(),
            spells: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Attack {
    pub name: String,
    pub bonus: String,
    pub damage: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Spellcasting {
    pub ability: String,
    pub modifier: String,
    #[serde(rename = "saveDC")]
    pub save_dc: String,
    pub attack_bonus: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellSlot {
    pub total: String,
    pub expended: String,
}

// =============================================================================
// Features & Equipment
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeaturesTraits {
    pub class_features: String,
    pub species_traits: String,
    pub feats: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Equipment {
    /// Comma-joined inventory.
    pub list: String,
    pub money: Money,
    pub proficiencies: EquipmentProficiencies,
    pub magic_item_attunement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Money {
    pub cp: String,
    pub sp: String,
    pub ep: String,
    pub gp: String,
    pub pp: String,
}

impl Default for Money {
    fn default() -> Self {
        let zero = || "0".to_string();
        Self {
            cp: zero(),
            sp: zero(),
            ep: zero(),
            gp: zero(),
            pp: zero(),
        }
    }
}

impl Money {
    pub fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("cp", &self.cp),
            ("sp", &self.sp),
            ("ep", &self.ep),
            ("gp", &self.gp),
            ("pp", &self.pp),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EquipmentProficiencies {
    pub armor_training: ArmorTraining,
    pub weapons: String,
    pub tools: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmorTraining {
    pub light: bool,
    pub medium: bool,
    pub heavy: bool,
    pub shields: bool,
}

impl ArmorTraining {
    pub fn entries(&self) -> [(&'static str, bool); 4] {
        [
            ("light", self.light),
            ("medium", self.medium),
            ("heavy", self.heavy),
            ("shields", self.shields),
        ]
    }
}

// =============================================================================
// Details
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterDetails {
    pub appearance: String,
    pub backstory_and_personality: String,
    /// Comma-joined languages.
    pub languages: String,
    pub size: String,
}

impl Default for CharacterDetails {
    fn default() -> Self {
        Self {
            appearance: String::new(),
            backstory_and_personality: String::new(),
            languages: String::new(),
            size: "Medium".to_string(),
        }
    }
}
