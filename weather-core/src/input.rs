use crate::{config::InputRules, error::WeatherError};

const MARKUP_CHARS: &[char] = &['<', '>', '"', '`', '&'];

/// Normalize a city name typed by the user, rejecting it before any
/// request is made when it cannot be a place name.
pub fn validate_city(input: &str, rules: &InputRules) -> Result<String, WeatherError> {
    let mut city: String = if rules.sanitize {
        input
            .chars()
            .map(|c| if c.is_whitespace() { ' ' } else { c })
            .filter(|c| !c.is_control() && !MARKUP_CHARS.contains(c))
            .collect()
    } else {
        input.to_string()
    };
    city = city.split_whitespace().collect::<Vec<_>>().join(" ");

    if city.is_empty() {
        return Err(WeatherError::Validation("Please enter a city name".into()));
    }

    if city.chars().count() > rules.max_city_name_length {
        return Err(WeatherError::Validation(format!(
            "City name must be at most {} characters",
            rules.max_city_name_length
        )));
    }

    if rules.validate_city_names
        && !city
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '.' | ',' | '\''))
    {
        return Err(WeatherError::Validation(format!("'{city}' is not a valid city name")));
    }

    Ok(city)
}
