/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "dashboard",
    aliases: &["d", "home", "stats"],
    description: "Study overview",
  },
  Command {
    name: "courses",
    aliases: &["c", "course"],
    description: "Manage courses",
  },
  Command {
    name: "goals",
    aliases: &["g", "goal"],
    description: "Study goals",
  },
  Command {
    name: "planner",
    aliases: &["p", "plan", "schedule"],
    description: "Study planner",
  },
  Command {
    name: "progress",
    aliases: &["pr", "report"],
    description: "Progress reports",
  },
  Command {
    name: "settings",
    aliases: &["s", "prefs"],
    description: "Preferences",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit NurseStudy",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Sort by priority, stable within a tier
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("courses");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "courses");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("c");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "courses");
  }

  #[test]
  fn test_alias_beats_prefix() {
    // "p" is the planner alias and a prefix of "progress"
    let suggestions = get_suggestions("p");
    assert_eq!(suggestions[0].name, "planner");
    assert!(suggestions.iter().any(|c| c.name == "progress"));
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("dash");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "dashboard");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("ours");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "courses");
  }

  #[test]
  fn test_no_match() {
    assert!(get_suggestions("xyz").is_empty());
  }
}
