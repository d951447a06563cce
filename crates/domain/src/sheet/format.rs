//! Plain-text rendering of the character sheet for narrator prompts.
//!
//! Sections always appear in the same order with the same headings. Empty
//! values are left out rather than rendered as blanks, and a section with
//! nothing to show is skipped entirely.

use crate::character_sheet::{CharacterSheet, Proficiency};

/// Render the sheet as a markdown-like block.
pub fn format_sheet(sheet: &CharacterSheet) -> String {
    let mut out = String::new();
    let identity = &sheet.core_identity;
    let stats = &sheet.stats;
    let combat = &sheet.combat;
    let magic = &sheet.attacks_spellcasting;
    let features = &sheet.features_traits;
    let equipment = &sheet.equipment;
    let details = &sheet.character_details;

    push_fields(
        &mut out,
        "Core Identity",
        &[
            ("Character Name", identity.character_name.as_str()),
            ("Background", identity.background.as_str()),
            ("Class", identity.class_name.as_str()),
            ("Level", identity.level.as_str()),
            ("Xp", identity.xp.as_str()),
            ("Species", identity.species.as_str()),
            ("Subclass", identity.subclass.as_str()),
            ("Alignment", identity.alignment.as_str()),
            ("Player Name", identity.player_name.as_str()),
        ],
    );

    let abilities: Vec<(String, &str)> = stats
        .abilities
        .entries()
        .into_iter()
        .map(|(name, score)| (capitalize(name), score))
        .collect();
    let abilities: Vec<(&str, &str)> = abilities.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    push_fields(&mut out, "Ability Scores", &abilities);

    let mut headline = String::new();
    push_line(&mut headline, "Proficiency Bonus", &stats.proficiency_bonus);
    push_line(&mut headline, "Passive Perception", &stats.passive_perception);
    if !headline.is_empty() {
        out.push_str(&headline);
        out.push('\n');
    }

    out.push_str(&format!(
        "**Saving Throw Proficiencies:** {}\n",
        proficient_names(&stats.saving_throws.entries())
    ));
    out.push_str(&format!(
        "**Skill Proficiencies:** {}\n\n",
        proficient_names(&stats.skills.entries())
    ));

    push_fields(
        &mut out,
        "Combat Stats",
        &[
            ("Armor Class", combat.armor_class.as_str()),
            ("Shield", combat.shield.as_str()),
            ("Initiative", combat.initiative.as_str()),
            ("Speed", combat.speed.as_str()),
            ("Size", details.size.as_str()),
            ("Heroic Inspiration", combat.heroic_inspiration.as_str()),
        ],
    );
    push_fields(
        &mut out,
        "Hit Points",
        &[
            ("Max", combat.hit_points.max.as_str()),
            ("Current", combat.hit_points.current.as_str()),
            ("Temporary", combat.hit_points.temporary.as_str()),
        ],
    );
    push_fields(
        &mut out,
        "Hit Dice",
        &[
            ("Max", combat.hit_dice.max.as_str()),
            ("Spent", combat.hit_dice.spent.as_str()),
        ],
    );

    let saves = &combat.death_saves;
    let successes = nonzero(saves.successes);
    let failures = nonzero(saves.failures);
    push_fields(
        &mut out,
        "Death Saves",
        &[("Successes", successes.as_str()), ("Failures", failures.as_str())],
    );

    let attacks: Vec<_> = magic
        .attacks
        .iter()
        .filter(|a| !a.name.trim().is_empty())
        .collect();
    if !attacks.is_empty() {
        out.push_str("### Weapons & Damage Cantrips\n");
        for attack in attacks {
            out.push_str(&format!(
                "- **Name:** {}, **Atk Bonus/DC:** {}, **Damage & Type:** {}, **Notes:** {}\n",
                attack.name, attack.bonus, attack.damage, attack.notes
            ));
        }
        out.push('\n');
    }

    push_text(&mut out, "Class Features", &features.class_features);
    push_text(&mut out, "Species Traits", &features.species_traits);
    push_text(&mut out, "Feats", &features.feats);

    let armor: Vec<&str> = equipment
        .proficiencies
        .armor_training
        .entries()
        .into_iter()
        .filter(|(_, trained)| *trained)
        .map(|(name, _)| name)
        .collect();
    let armor = if armor.is_empty() {
        "None".to_string()
    } else {
        armor.join(", ")
    };
    push_fields(
        &mut out,
        "Equipment Training & Proficiencies",
        &[
            ("Armor Training", armor.as_str()),
            ("Weapons", equipment.proficiencies.weapons.as_str()),
            ("Tools", equipment.proficiencies.tools.as_str()),
        ],
    );

    push_fields(
        &mut out,
        "Spellcasting",
        &[
            ("Ability", magic.spellcasting.ability.as_str()),
            ("Modifier", magic.spellcasting.modifier.as_str()),
            ("Save DC", magic.spellcasting.save_dc.as_str()),
            ("Attack Bonus", magic.spellcasting.attack_bonus.as_str()),
        ],
    );

    let slots: Vec<String> = magic
        .spell_slots
        .iter()
        .filter(|(_, slot)| !slot.total.trim().is_empty())
        .map(|(level, slot)| {
            let expended = if slot.expended.trim().is_empty() {
                "0"
            } else {
                slot.expended.as_str()
            };
            format!("  - Level {}: {} total, {} expended\n", level, slot.total, expended)
        })
        .collect();
    if !slots.is_empty() {
        out.push_str("### Spell Slots\n");
        for slot in slots {
            out.push_str(&slot);
        }
        out.push('\n');
    }

    push_text(&mut out, "Cantrips & Prepared Spells", &magic.spells);
    push_text(&mut out, "Appearance", &details.appearance);
    push_text(&mut out, "Backstory & Personality", &details.backstory_and_personality);
    push_text(&mut out, "Languages", &details.languages);
    push_text(&mut out, "Equipment", &equipment.list);
    push_text(&mut out, "Magic Item Attunement", &equipment.magic_item_attunement);

    let money: Vec<(String, &str)> = equipment
        .money
        .entries()
        .into_iter()
        .map(|(coin, amount)| (coin.to_uppercase(), amount))
        .collect();
    let money: Vec<(&str, &str)> = money.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    push_fields(&mut out, "Money", &money);

    out
}

fn push_line(out: &mut String, label: &str, value: &str) {
    if !value.trim().is_empty() {
        out.push_str(&format!("**{}:** {}\n", label, value.trim()));
    }
}

fn push_fields(out: &mut String, title: &str, fields: &[(&str, &str)]) {
    let mut body = String::new();
    for (label, value) in fields {
        push_line(&mut body, label, value);
    }
    if body.is_empty() {
        return;
    }
    out.push_str(&format!("### {}\n", title));
    out.push_str(&body);
    out.push('\n');
}

fn push_text(out: &mut String, title: &str, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    out.push_str(&format!("### {}\n{}\n\n", title, text.trim()));
}

fn proficient_names(entries: &[(&'static str, Proficiency)]) -> String {
    let names: Vec<&str> = entries
        .iter()
        .filter(|(_, p)| p.proficient)
        .map(|(name, _)| *name)
        .collect();
    if names.is_empty() {
        "None".to_string()
    } else {
        names.join(", ")
    }
}

fn nonzero(n: u8) -> String {
    if n == 0 {
        String::new()
    } else {
        n.to_string()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hero() -> CharacterSheet {
        let mut sheet = CharacterSheet::default();
        sheet.core_identity.character_name = "Mira Vale".to_string();
        sheet.core_identity.class_name = "Rogue".to_string();
        sheet.stats.skills.stealth.proficient = true;
        sheet.stats.skills.sleight_of_hand.proficient = true;
        sheet.stats.saving_throws.dexterity.proficient = true;
        sheet.attacks_spellcasting.attacks[0].name = "Dagger".to_string();
        sheet.attacks_spellcasting.attacks[0].bonus = "+5".to_string();
        sheet.attacks_spellcasting.attacks[0].damage = "1d4+3 piercing".to_string();
        sheet.character_details.languages = "Common, Thieves' Cant".to_string();
        sheet.equipment.list = "rope, lockpicks".to_string();
        sheet.equipment.money.gp = "15".to_string();
        sheet
    }

    #[test]
    fn test_is_deterministic() {
        assert_eq!(format_sheet(&hero()), format_sheet(&hero()));
    }

    #[test]
    fn test_renders_fields_and_omits_empty_values() {
        let text = format_sheet(&hero());
        assert!(text.contains("### Core Identity\n**Character Name:** Mira Vale\n"));
        assert!(text.contains("**Class:** Rogue"));
        assert!(!text.contains("**Background:**"));
        assert!(!text.contains("### Class Features"));
        assert!(!text.contains("### Death Saves"));
    }

    #[test]
    fn test_proficiencies_are_comma_joined() {
        let text = format_sheet(&hero());
        assert!(text.contains("**Saving Throw Proficiencies:** dexterity\n"));
        assert!(text.contains("**Skill Proficiencies:** sleightOfHand, stealth\n"));

        let blank = format_sheet(&CharacterSheet::default());
        assert!(blank.contains("**Saving Throw Proficiencies:** None"));
        assert!(blank.contains("**Skill Proficiencies:** None"));
    }

    #[test]
    fn test_sections_keep_fixed_order() {
        let text = format_sheet(&hero());
        let order = [
            "### Core Identity",
            "### Ability Scores",
            "**Proficiency Bonus:**",
            "**Saving Throw Proficiencies:**",
            "### Combat Stats",
            "### Hit Points",
            "### Hit Dice",
            "### Weapons & Damage Cantrips",
            "### Equipment Training & Proficiencies",
            "### Languages",
            "### Equipment\n",
            "### Money",
        ];
        let positions: Vec<usize> = order.iter().map(|h| text.find(h).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", text);
    }

    #[test]
    fn test_attack_and_money_lines() {
        let text = format_sheet(&hero());
        assert!(text.contains(
            "- **Name:** Dagger, **Atk Bonus/DC:** +5, **Damage & Type:** 1d4+3 piercing, **Notes:** \n"
        ));
        assert!(text.contains("**GP:** 15"));
        assert!(text.contains("**Armor Training:** None"));
    }
}
