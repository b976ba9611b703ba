//! Deterministic replies used when the remote model is unavailable.
//!
//! The language is picked from keywords in the user's words of the last
//! message (the appended weather block is ignored), then a per-language
//! template renders the reply from the weather data.

use serde_json::{Value, json};
use std::fmt::Write;

use super::ChatMessage;
use crate::{model::AllWeather, prompt};

pub const HOT_THRESHOLD_C: f64 = 30.0;
pub const COOL_THRESHOLD_C: f64 = 16.0;

pub const HOT_MARKER: &str = "Fa molto caldo!";
pub const COOL_MARKER: &str = "Fa fresco!";
pub const RAIN_MARKER: &str = "Possibilità di pioggia!";
pub const PLEASANT_MARKER: &str = "Giornata piacevole!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Italian,
    French,
    Spanish,
    German,
    English,
}

/// Detection order; the first language with a matching keyword wins.
const PRIORITY: [(Language, &[&str]); 4] = [
    (Language::Italian, &["ciao", "come", "che", "oggi", "tempo", "fa", "piove"]),
    (Language::French, &["bonjour", "quel", "fait", "temps", "aujourd"]),
    (Language::Spanish, &["hola", "qué", "hace", "tiempo", "llueve"]),
    (Language::German, &["hallo", "wie", "wetter", "heute", "regnet"]),
];

impl Language {
    /// Case-insensitive keyword match over the words of `text`. Whole words
    /// only, so "fa" does not fire inside "fait".
    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        PRIORITY
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| words.contains(k)))
            .map(|(lang, _)| *lang)
            .unwrap_or(Language::English)
    }

    fn weather_template(self) -> fn(&AllWeather) -> String {
        match self {
            Language::Italian => italian,
            Language::French => french,
            Language::Spanish => spanish,
            Language::German => german,
            Language::English => english,
        }
    }

    fn greeting(self, location: &str) -> String {
        match self {
            Language::Italian => {
                format!("Benvenuto! Sono il tuo assistente meteo per {location}. Come posso aiutarti?")
            }
            Language::French => format!(
                "Bienvenue! Je suis votre assistant météo pour {location}. Comment puis-je vous aider?"
            ),
            Language::Spanish => format!(
                "¡Bienvenido! Soy tu asistente meteorológico para {location}. ¿Cómo puedo ayudarte?"
            ),
            Language::German => {
                format!("Willkommen! Ich bin Ihr Wetterassistent für {location}. Wie kann ich Ihnen helfen?")
            }
            Language::English => {
                format!("Welcome! I'm your weather assistant for {location}. How can I help you?")
            }
        }
    }
}

/// Fallback reply text for a conversation. `location` is named in the
/// greeting when there is no weather data.
pub fn reply(messages: &[ChatMessage], weather: Option<&AllWeather>, location: &str) -> String {
    let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
    let language = Language::detect(prompt::user_text(last));

    match weather {
        Some(weather) => language.weather_template()(weather),
        None => language.greeting(location),
    }
}

/// Fallback reply wrapped like a chat-completion response.
pub fn demo_response(messages: &[ChatMessage], weather: Option<&AllWeather>, location: &str) -> Value {
    json!({
        "choices": [{
            "message": { "role": "assistant", "content": reply(messages, weather, location) }
        }]
    })
}

fn italian(weather: &AllWeather) -> String {
    let current = &weather.current;
    let temp = current.temperature_c;
    let conditions = current.description.to_lowercase();

    let mut out = format!(
        "📍 **{} - Stazione {}**\n\n",
        weather.location, weather.station_id
    );
    let _ = writeln!(out, "🌡️ Temperatura attuale: **{temp}°C**");
    let _ = writeln!(out, "💧 Umidità: {}%", current.humidity);
    let _ = writeln!(out, "☁️ Condizioni: {}\n", current.description);

    if temp > HOT_THRESHOLD_C {
        let _ = writeln!(out, "🔥 **{HOT_MARKER}** Ecco i miei consigli:");
        out.push_str("• Indossa abiti leggeri e di colore chiaro\n");
        out.push_str("• Bevi almeno 2 litri d'acqua durante la giornata\n");
        out.push_str("• Evita di uscire tra le 12:00 e le 16:00\n");
        out.push_str("• Usa la protezione solare SPF 30+\n");
        out.push_str("• Cerca luoghi con aria condizionata\n");
    } else if temp < COOL_THRESHOLD_C {
        let _ = writeln!(out, "❄️ **{COOL_MARKER}** Ti consiglio di:");
        out.push_str("• Indossare una giacca o un maglione\n");
        out.push_str("• Portare con te una sciarpa leggera\n");
        out.push_str("• Bere bevande calde per scaldarti\n");
    } else if conditions.contains("rain") || conditions.contains("pioggia") {
        let _ = writeln!(out, "🌧️ **{RAIN_MARKER}**");
        out.push_str("• Non dimenticare l'ombrello ☂️\n");
        out.push_str("• Indossa scarpe impermeabili\n");
        out.push_str("• Guida con prudenza se devi spostarti\n");
    } else {
        let _ = writeln!(out, "✨ **{PLEASANT_MARKER}**");
        out.push_str("• Perfetta per una passeggiata\n");
        out.push_str("• Goditi il bel tempo!\n");
    }

    let forecast = &weather.forecast;
    out.push_str("\n📅 **Previsioni:**\n");
    let _ = writeln!(
        out,
        "Oggi: Max {}°C, Min {}°C",
        forecast.today.high_c, forecast.today.low_c
    );
    let _ = write!(
        out,
        "Domani: Max {}°C, Min {}°C",
        forecast.tomorrow.high_c, forecast.tomorrow.low_c
    );

    out
}

fn french(weather: &AllWeather) -> String {
    let (temp, place) = (weather.current.temperature_c, &weather.location);
    if temp > HOT_THRESHOLD_C {
        format!("Il fait actuellement {temp}°C à {place}. Très chaud! N'oubliez pas de vous hydrater et de porter des vêtements légers.")
    } else if temp < COOL_THRESHOLD_C {
        format!("Il fait {temp}°C à {place}. Il fait frais, je vous conseille de bien vous couvrir.")
    } else {
        format!(
            "Il fait {temp}°C à {place} avec {}. Le temps est agréable!",
            weather.current.description
        )
    }
}

fn spanish(weather: &AllWeather) -> String {
    let (temp, place) = (weather.current.temperature_c, &weather.location);
    if temp > HOT_THRESHOLD_C {
        format!("La temperatura actual en {place} es {temp}°C. ¡Hace mucho calor! Recuerda hidratarte bien y usar ropa ligera.")
    } else if temp < COOL_THRESHOLD_C {
        format!("La temperatura es {temp}°C. Hace fresco, te recomiendo abrigarte bien.")
    } else {
        format!(
            "Hay {temp}°C en {place} con {}. ¡El tiempo está agradable!",
            weather.current.description
        )
    }
}

fn german(weather: &AllWeather) -> String {
    let (temp, place) = (weather.current.temperature_c, &weather.location);
    if temp > HOT_THRESHOLD_C {
        format!("Es ist derzeit {temp}°C in {place}. Sehr heiß! Denken Sie daran, viel zu trinken und leichte Kleidung zu tragen.")
    } else if temp < COOL_THRESHOLD_C {
        format!("Es ist {temp}°C in {place}. Es ist kühl, ich empfehle warme Kleidung.")
    } else {
        format!(
            "Es sind {temp}°C in {place} mit {}. Das Wetter ist angenehm!",
            weather.current.description
        )
    }
}

fn english(weather: &AllWeather) -> String {
    let (temp, place) = (weather.current.temperature_c, &weather.location);
    if temp > HOT_THRESHOLD_C {
        format!("Current temperature in {place} is {temp}°C. Very hot! Remember to stay hydrated and wear light clothes.")
    } else if temp < COOL_THRESHOLD_C {
        format!("Temperature is {temp}°C. It's cool, I recommend wearing warm clothes.")
    } else {
        format!(
            "It's {temp}°C in {place} with {}. Pleasant weather!",
            weather.current.description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use crate::provider::{fallback_forecast, fallback_snapshot};

    fn weather(temp: f64, description: &str) -> AllWeather {
        let mut current = fallback_snapshot("IROME8278", String::new());
        current.temperature_c = temp;
        current.description = description.into();

        AllWeather {
            current,
            forecast: fallback_forecast(String::new()),
            location: "Rome, Italy".into(),
            station_id: "IROME8278".into(),
        }
    }

    fn answer(messages: &[ChatMessage], weather: Option<&AllWeather>) -> String {
        reply(messages, weather, "Rome, Italy")
    }

    fn ask(text: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::new(Role::System, "Rispondi sempre in italiano, che bello"),
            ChatMessage::new(Role::User, text),
        ]
    }

    #[test]
    fn detects_languages() {
        assert_eq!(Language::detect("Ciao, che tempo fa oggi?"), Language::Italian);
        assert_eq!(Language::detect("Hello, what's the weather?"), Language::English);
        assert_eq!(Language::detect("Bonjour! Il fait beau aujourd'hui?"), Language::French);
        assert_eq!(Language::detect("Hola, ¿qué tiempo hace?"), Language::Spanish);
        assert_eq!(Language::detect("Wie ist das Wetter heute?"), Language::German);
        assert_eq!(Language::detect(""), Language::English);
    }

    #[test]
    fn detection_is_case_insensitive() {
        assert_eq!(Language::detect("CIAO!"), Language::Italian);
        assert_eq!(Language::detect("HALLO"), Language::German);
        assert_eq!(Language::detect("¿QUÉ TAL?"), Language::Spanish);
    }

    #[test]
    fn ties_follow_priority_order() {
        // "tempo" is Italian, "hola" Spanish, "wetter" German.
        assert_eq!(Language::detect("hola wetter tempo"), Language::Italian);
        assert_eq!(Language::detect("wetter hola"), Language::Spanish);
    }

    #[test]
    fn only_last_message_is_scanned() {
        let text = answer(&ask("Hello, what's the weather?"), Some(&weather(22.0, "Clear")));
        assert_eq!(text, "It's 22°C in Rome, Italy with Clear. Pleasant weather!");
    }

    #[test]
    fn appended_weather_block_does_not_pick_language() {
        let data = weather(22.0, "Clear");
        let noon = chrono::NaiveTime::from_hms_opt(12, 0, 0).unwrap();

        for (question, start) in [
            ("Hello, what's the weather?", "It's 22°C"),
            ("Bonjour, quel temps?", "Il fait 22°C"),
            ("Hallo, wie ist das Wetter?", "Es sind 22°C"),
        ] {
            let messages = prompt::build_messages("system", question, &data, true, noon);
            assert!(messages[1].content.contains("Previsioni oggi"));
            assert!(answer(&messages, Some(&data)).starts_with(start), "{question}");
        }
    }

    #[test]
    fn italian_hot_band() {
        let text = answer(&ask("Ciao, come mi vesto oggi?"), Some(&weather(32.0, "Sunny")));

        assert!(text.contains(HOT_MARKER));
        assert!(text.contains("**32°C**"));
        assert!(text.contains("Stazione IROME8278"));
        assert!(!text.contains(COOL_MARKER));
    }

    #[test]
    fn italian_cool_band() {
        let text = answer(&ask("Ciao"), Some(&weather(10.0, "Light Rain")));

        assert!(text.contains(COOL_MARKER));
        assert!(!text.contains(RAIN_MARKER));
    }

    #[test]
    fn italian_rain_band() {
        let text = answer(&ask("Piove oggi?"), Some(&weather(20.0, "Light Rain")));
        assert!(text.contains(RAIN_MARKER));

        let text = answer(&ask("Piove oggi?"), Some(&weather(20.0, "Pioggia debole")));
        assert!(text.contains(RAIN_MARKER));
    }

    #[test]
    fn italian_pleasant_band_and_forecast() {
        let text = answer(&ask("Che tempo fa?"), Some(&weather(22.0, "Partly Cloudy")));

        assert!(text.contains(PLEASANT_MARKER));
        assert!(text.contains("Oggi: Max 28°C, Min 18°C"));
        assert!(text.ends_with("Domani: Max 30°C, Min 19°C"));
    }

    #[test]
    fn thresholds_are_strict() {
        let at_hot = answer(&ask("ciao"), Some(&weather(30.0, "Clear")));
        assert!(!at_hot.contains(HOT_MARKER));

        let at_cool = answer(&ask("ciao"), Some(&weather(16.0, "Clear")));
        assert!(!at_cool.contains(COOL_MARKER));
    }

    #[test]
    fn other_languages_name_temperature() {
        let hot = weather(33.5, "Sunny");
        assert!(answer(&ask("Bonjour"), Some(&hot)).contains("33.5°C"));
        assert!(answer(&ask("Hola"), Some(&hot)).contains("mucho calor"));
        assert!(answer(&ask("Hallo"), Some(&hot)).contains("Sehr heiß"));
        assert!(answer(&ask("Hi"), Some(&hot)).contains("Very hot"));

        let cool = weather(8.0, "Fog");
        assert!(answer(&ask("Hallo"), Some(&cool)).contains("kühl"));
    }

    #[test]
    fn greets_without_weather() {
        assert!(answer(&ask("Ciao"), None).starts_with("Benvenuto!"));
        assert!(answer(&ask("Hello"), None).starts_with("Welcome!"));
        assert!(answer(&[], None).starts_with("Welcome!"));
        assert!(reply(&ask("Hello"), None, "Milan, Italy").contains("for Milan, Italy."));
    }

    #[test]
    fn demo_response_has_completion_shape() {
        let response = demo_response(&ask("Hello"), None, "Rome, Italy");
        let message = &response["choices"][0]["message"];

        assert_eq!(message["role"], "assistant");
        assert!(!message["content"].as_str().unwrap().is_empty());
    }
}
