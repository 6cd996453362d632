pub const NOTE_SYSTEM: &str = include_str!("../data/prompts/note_system.txt");
pub const NOTE_MEDIA_SYSTEM: &str = include_str!("../data/prompts/note_media_system.txt");
pub const FILE_SYSTEM: &str = include_str!("../data/prompts/file_system.txt");
pub const NOTE_USER: &str = include_str!("../data/prompts/note_user.txt");
pub const FILE_USER: &str = include_str!("../data/prompts/file_user.txt");
pub const EXAMPLE_NOTE: &str = include_str!("../data/prompts/example_note.txt");

/// Worked answers for [`EXAMPLE_NOTE`], in the order they are shown to the model.
pub const EXAMPLE_CARDS: [(&str, &str); 12] = [
    (
        "What two things drive the water cycle?",
        "Energy from the Sun and gravity.",
    ),
    (
        "What happens to surface water during evaporation?",
        "The Sun heats it and it turns into water vapour.",
    ),
    (
        "Where does most evaporation happen?",
        "Over the oceans.",
    ),
    (
        "What is transpiration?",
        "Plants releasing water vapour through their leaves.",
    ),
    (
        "What are the small pores in leaves that release water vapour called?",
        "Stomata.",
    ),
    (
        "How do clouds form during condensation?",
        "Rising water vapour cools and forms droplets around dust particles.",
    ),
    (
        "When does precipitation fall?",
        "When droplets merge and become heavy enough to fall.",
    ),
    (
        "Name four forms of precipitation.",
        "Rain, snow, sleet, and hail.",
    ),
    (
        "What is infiltration?",
        "Precipitation soaking into the soil.",
    ),
    (
        "What are underground stores of water called?",
        "Aquifers.",
    ),
    (
        "Where does runoff go?",
        "Over the surface into streams and rivers, then back to the sea.",
    ),
    (
        "Roughly what share of Earth's water is easily usable fresh liquid water?",
        "About 1%.",
    ),
];

/// Replace `{{key}}` placeholders in a template string.
///
/// Substitution is a single pass over the template, so placeholders inside
/// substituted values are left as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            rest = &rest[start..];
            break;
        };

        let key = &after[..end];
        match vars.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => result.push_str(value),
            None => result.push_str(&rest[start..start + end + 4]),
        }
        rest = &after[end + 2..];
    }

    result.push_str(rest);
    result
}
