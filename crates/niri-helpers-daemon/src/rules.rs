//! Float rules compiled from configuration

use niri_helpers_config::{FloatConfig, FloatRule, MatchSpec};
use niri_helpers_ipc::{Action, PositionChange, SizeChange, Window};
use regex::{Regex, RegexBuilder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("No float rules configured")]
    NoRules,

    #[error("Invalid pattern {pattern:?} in rule {rule}")]
    InvalidPattern {
        rule: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Title and/or app-id predicate; every pattern present must match
#[derive(Debug, Clone)]
pub struct Match {
    title: Option<Regex>,
    app_id: Option<Regex>,
}

impl Match {
    fn compile(spec: &MatchSpec, rule: usize) -> Result<Self, RuleError> {
        Ok(Self {
            title: spec.title.as_deref().map(|p| compile(p, rule)).transpose()?,
            app_id: spec.app_id.as_deref().map(|p| compile(p, rule)).transpose()?,
        })
    }

    /// A predicate with no patterns matches nothing
    pub fn matches(&self, window: &Window) -> bool {
        if self.title.is_none() && self.app_id.is_none() {
            return false;
        }

        let title_ok = self
            .title
            .as_ref()
            .map_or(true, |re| re.is_match(&window.title));
        let app_id_ok = self
            .app_id
            .as_ref()
            .map_or(true, |re| re.is_match(&window.app_id));

        title_ok && app_id_ok
    }
}

fn compile(pattern: &str, rule: usize) -> Result<Regex, RuleError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| RuleError::InvalidPattern {
            rule,
            pattern: pattern.to_string(),
            source,
        })
}

#[derive(Debug, Clone)]
pub struct Rule {
    matches: Vec<Match>,
    excludes: Vec<Match>,
    width: Option<i32>,
    height: Option<i32>,
    centered: bool,
}

impl Rule {
    fn compile(rule: &FloatRule, index: usize) -> Result<Self, RuleError> {
        Ok(Self {
            matches: rule
                .matches
                .iter()
                .map(|m| Match::compile(m, index))
                .collect::<Result<_, _>>()?,
            excludes: rule
                .excludes
                .iter()
                .map(|m| Match::compile(m, index))
                .collect::<Result<_, _>>()?,
            width: rule.width,
            height: rule.height,
            centered: rule.centered,
        })
    }

    /// Any match predicate hits and no exclude does
    ///
    /// A rule without match predicates never matches.
    pub fn matches(&self, window: &Window) -> bool {
        self.matches.iter().any(|m| m.matches(window))
            && !self.excludes.iter().any(|m| m.matches(window))
    }

    /// Actions applied the first time `window` matches
    ///
    /// Float, then height, then width, then centering. Centering uses the
    /// rule's size, falling back to the window's current size.
    pub fn actions(&self, window: &Window) -> Vec<Action> {
        let id = window.id;
        let mut actions = vec![Action::MoveWindowToFloating { id }];

        if let Some(height) = self.height {
            actions.push(Action::SetWindowHeight {
                id,
                change: SizeChange::SetFixed(height),
            });
        }

        if let Some(width) = self.width {
            actions.push(Action::SetWindowWidth {
                id,
                change: SizeChange::SetFixed(width),
            });
        }

        if self.centered {
            let (current_width, current_height) = window.layout.window_size.unwrap_or((0, 0));
            let width = self.width.unwrap_or(current_width);
            let height = self.height.unwrap_or(current_height);
            actions.extend(centering(id, width, height));
        }

        actions
    }
}

/// Move to the middle of the output, then shift by the window size since the
/// position refers to the top-left corner.
///
/// The vertical shift is a quarter of the height, not half.
fn centering(id: u64, width: i32, height: i32) -> [Action; 2] {
    [
        Action::MoveFloatingWindow {
            id,
            x: PositionChange::SetProportion(50.0),
            y: PositionChange::SetProportion(50.0),
        },
        Action::MoveFloatingWindow {
            id,
            x: PositionChange::AdjustFixed(-(f64::from(width) / 2.0)),
            y: PositionChange::AdjustFixed(f64::from(height) / 4.0),
        },
    ]
}

/// Ordered set of rules; the first matching rule wins
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<Rule>,
}

impl RuleEngine {
    /// Compile the configured rules
    ///
    /// # Errors
    ///
    /// Returns `RuleError::NoRules` for an empty rule list and
    /// `RuleError::InvalidPattern` for a pattern that does not compile.
    pub fn new(config: &FloatConfig) -> Result<Self, RuleError> {
        if config.rules.is_empty() {
            return Err(RuleError::NoRules);
        }

        let rules = config
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| Rule::compile(rule, index))
            .collect::<Result<_, _>>()?;

        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn evaluate(&self, window: &Window) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use niri_helpers_ipc::WindowLayout;

    fn window(title: &str, app_id: &str) -> Window {
        Window {
            id: 5,
            app_id: app_id.to_string(),
            title: title.to_string(),
            workspace_id: Some(1),
            is_floating: false,
            layout: WindowLayout {
                pos_in_scrolling_layout: Some((2, 1)),
                window_size: Some((1000, 800)),
            },
        }
    }

    fn spec(title: Option<&str>, app_id: Option<&str>) -> MatchSpec {
        MatchSpec {
            title: title.map(str::to_string),
            app_id: app_id.map(str::to_string),
        }
    }

    fn engine(rules: Vec<FloatRule>) -> RuleEngine {
        RuleEngine::new(&FloatConfig { rules }).unwrap()
    }

    #[test]
    fn test_zero_rules_rejected() {
        let result = RuleEngine::new(&FloatConfig::default());
        assert!(matches!(result, Err(RuleError::NoRules)));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let rule = FloatRule {
            matches: vec![spec(Some("(unclosed"), None)],
            ..FloatRule::default()
        };
        match RuleEngine::new(&FloatConfig { rules: vec![rule] }) {
            Err(RuleError::InvalidPattern { rule, pattern, .. }) => {
                assert_eq!(rule, 0);
                assert_eq!(pattern, "(unclosed");
            }
            other => panic!("Expected InvalidPattern, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_match_list_never_matches() {
        let engine = engine(vec![
            FloatRule::default(),
            FloatRule {
                excludes: vec![spec(Some("nothing"), None)],
                ..FloatRule::default()
            },
        ]);

        for w in [window("", ""), window("Spotify", "spotify"), window("x", "y")] {
            assert!(engine.evaluate(&w).is_none());
        }
    }

    #[test]
    fn test_empty_match_predicate_never_matches() {
        let engine = engine(vec![FloatRule {
            matches: vec![spec(None, None)],
            ..FloatRule::default()
        }]);

        assert!(engine.evaluate(&window("anything", "any")).is_none());
    }

    #[test]
    fn test_title_match_is_case_insensitive_search() {
        let engine = engine(vec![FloatRule {
            matches: vec![spec(Some("Spotify"), None)],
            ..FloatRule::default()
        }]);

        assert!(engine.evaluate(&window("Spotify – Song", "")).is_some());
        assert!(engine.evaluate(&window("now playing: spotify", "")).is_some());
        assert!(engine.evaluate(&window("Firefox", "")).is_none());
    }

    #[test]
    fn test_title_and_app_id_in_one_match_are_and_combined() {
        let engine = engine(vec![FloatRule {
            matches: vec![spec(Some("^Volume"), Some("pavucontrol"))],
            ..FloatRule::default()
        }]);

        assert!(engine
            .evaluate(&window("Volume Control", "org.pulseaudio.pavucontrol"))
            .is_some());
        assert!(engine.evaluate(&window("Volume Control", "foot")).is_none());
        assert!(engine.evaluate(&window("Settings", "pavucontrol")).is_none());
    }

    #[test]
    fn test_matches_are_or_combined_and_excludes_veto() {
        let engine = engine(vec![FloatRule {
            matches: vec![spec(Some("Picture-in-Picture"), None), spec(None, Some("^mpv$"))],
            excludes: vec![spec(Some("Settings"), None)],
            ..FloatRule::default()
        }]);

        assert!(engine.evaluate(&window("Picture-in-Picture", "firefox")).is_some());
        assert!(engine.evaluate(&window("video.mkv", "mpv")).is_some());
        assert!(engine.evaluate(&window("mpv Settings", "mpv")).is_none());
        assert!(engine.evaluate(&window("video.mkv", "mpv-helper")).is_none());
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let engine = engine(vec![
            FloatRule {
                matches: vec![spec(Some("pip"), None)],
                width: Some(100),
                ..FloatRule::default()
            },
            FloatRule {
                matches: vec![spec(Some("pip"), None)],
                width: Some(200),
                ..FloatRule::default()
            },
        ]);

        let rule = engine.evaluate(&window("pip", "")).unwrap();
        assert_eq!(rule.width, Some(100));
    }

    #[test]
    fn test_actions_order_and_centering() {
        let engine = engine(vec![FloatRule {
            matches: vec![spec(Some("pip"), None)],
            width: Some(640),
            height: Some(360),
            centered: true,
            ..FloatRule::default()
        }]);
        let w = window("pip", "");

        let actions = engine.evaluate(&w).unwrap().actions(&w);

        assert_eq!(
            actions,
            vec![
                Action::MoveWindowToFloating { id: 5 },
                Action::SetWindowHeight {
                    id: 5,
                    change: SizeChange::SetFixed(360)
                },
                Action::SetWindowWidth {
                    id: 5,
                    change: SizeChange::SetFixed(640)
                },
                Action::MoveFloatingWindow {
                    id: 5,
                    x: PositionChange::SetProportion(50.0),
                    y: PositionChange::SetProportion(50.0),
                },
                Action::MoveFloatingWindow {
                    id: 5,
                    x: PositionChange::AdjustFixed(-320.0),
                    y: PositionChange::AdjustFixed(90.0),
                },
            ]
        );
    }

    #[test]
    fn test_float_only_rule() {
        let engine = engine(vec![FloatRule {
            matches: vec![spec(None, Some("pavucontrol"))],
            ..FloatRule::default()
        }]);
        let w = window("Volume", "pavucontrol");

        let actions = engine.evaluate(&w).unwrap().actions(&w);

        assert_eq!(actions, vec![Action::MoveWindowToFloating { id: 5 }]);
    }

    #[test]
    fn test_centering_without_size_uses_window_size() {
        let engine = engine(vec![FloatRule {
            matches: vec![spec(Some("pip"), None)],
            centered: true,
            ..FloatRule::default()
        }]);
        let w = window("pip", "");

        let actions = engine.evaluate(&w).unwrap().actions(&w);

        assert_eq!(
            actions.last(),
            Some(&Action::MoveFloatingWindow {
                id: 5,
                x: PositionChange::AdjustFixed(-500.0),
                y: PositionChange::AdjustFixed(200.0),
            })
        );
    }
}
