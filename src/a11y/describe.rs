use crate::knowledge::{KnowledgeNode, KnowledgeRelationship, Locale};

pub fn no_results(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "No results: no nodes match the current filters.",
        Locale::Pl => "Brak wyników: żaden węzeł nie pasuje do bieżących filtrów.",
    }
}

pub fn describe_render_set(nodes: usize, relationships: usize, locale: Locale) -> String {
    if nodes == 0 {
        return no_results(locale).to_owned();
    }

    match locale {
        Locale::En => format!(
            "Knowledge graph: {nodes} {}, {relationships} {}.",
            plural_en(nodes, "node", "nodes"),
            plural_en(relationships, "relationship", "relationships"),
        ),
        Locale::Pl => format!(
            "Graf wiedzy: {nodes} {}, {relationships} {}.",
            plural_pl(nodes, "węzeł", "węzły", "węzłów"),
            plural_pl(relationships, "połączenie", "połączenia", "połączeń"),
        ),
    }
}

pub fn describe_node(node: &KnowledgeNode, locale: Locale) -> String {
    let name = node.display_name(locale);
    let node_type = node.node_type.label(locale);
    let evidence = node.evidence_level.label(locale);
    let mut text = match locale {
        Locale::En => format!("{name}, {node_type}, evidence: {evidence}"),
        Locale::Pl => format!("{name}, {node_type}, poziom dowodów: {evidence}"),
    };
    if !node.category.is_empty() {
        text.push_str(match locale {
            Locale::En => ", category: ",
            Locale::Pl => ", kategoria: ",
        });
        text.push_str(&node.category);
    }
    text.push('.');
    text
}

pub fn describe_relationship(
    relationship: &KnowledgeRelationship,
    source: &str,
    target: &str,
    locale: Locale,
) -> String {
    let verb = relationship.relationship_type.verb(locale);
    let kind = relationship.relationship_type.label(locale);
    let evidence = relationship.evidence_level.label(locale);
    let strength = (relationship.strength * 100.0).round() as u32;
    match locale {
        Locale::En => format!(
            "{source} {verb} {target}. Relationship: {kind}, strength {strength}%, evidence: {evidence}."
        ),
        Locale::Pl => format!(
            "{source} {verb} {target}. Relacja: {kind}, siła {strength}%, poziom dowodów: {evidence}."
        ),
    }
}

pub fn selection_changed(name: &str, selected: bool, locale: Locale) -> String {
    match (locale, selected) {
        (Locale::En, true) => format!("Selected node: {name}"),
        (Locale::En, false) => format!("Deselected node: {name}"),
        (Locale::Pl, true) => format!("Wybrano węzeł: {name}"),
        (Locale::Pl, false) => format!("Odznaczono węzeł: {name}"),
    }
}

pub fn view_reset(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Graph view reset",
        Locale::Pl => "Widok grafu został zresetowany",
    }
}

pub fn keyboard_help(locale: Locale) -> &'static str {
    match locale {
        Locale::En => {
            "Tab and Shift+Tab move through the graph, arrow keys follow relationships, \
             Enter selects the focused node, Escape clears focus."
        }
        Locale::Pl => {
            "Tab i Shift+Tab przechodzą po grafie, strzałki podążają za połączeniami, \
             Enter wybiera węzeł, Escape czyści fokus."
        }
    }
}

fn plural_en(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

/// Polish takes the "few" form for 2-4 in the last digit, except 12-14.
fn plural_pl(
    count: usize,
    one: &'static str,
    few: &'static str,
    many: &'static str,
) -> &'static str {
    if count == 1 {
        return one;
    }
    match (count % 10, count % 100) {
        (2..=4, tens) if !(12..=14).contains(&tens) => few,
        _ => many,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_reads_as_no_results() {
        assert_eq!(describe_render_set(0, 0, Locale::En), no_results(Locale::En));
        assert_eq!(
            describe_render_set(1, 2, Locale::En),
            "Knowledge graph: 1 node, 2 relationships."
        );
        assert!(describe_render_set(0, 0, Locale::Pl).starts_with("Brak wyników"));
    }

    #[test]
    fn polish_summary_uses_the_right_plural_forms() {
        assert_eq!(
            describe_render_set(1, 1, Locale::Pl),
            "Graf wiedzy: 1 węzeł, 1 połączenie."
        );
        assert_eq!(
            describe_render_set(3, 22, Locale::Pl),
            "Graf wiedzy: 3 węzły, 22 połączenia."
        );
        assert_eq!(
            describe_render_set(5, 12, Locale::Pl),
            "Graf wiedzy: 5 węzłów, 12 połączeń."
        );
        assert_eq!(
            describe_render_set(111, 0, Locale::Pl),
            "Graf wiedzy: 111 węzłów, 0 połączeń."
        );
    }

    #[test]
    fn selection_messages_follow_locale() {
        assert_eq!(selection_changed("Kofeina", true, Locale::Pl), "Wybrano węzeł: Kofeina");
        assert_eq!(selection_changed("Caffeine", false, Locale::En), "Deselected node: Caffeine");
    }
}
