//! Supported reply languages and their prompt templates.

use std::fmt;

struct LanguageEntry {
    code: &'static str,
    name: &'static str,
    native_name: &'static str,
    /// Writing system named in the reply instruction; `None` for English.
    script: Option<&'static str>,
    no_response: &'static str,
    error: &'static str,
}

static ENGLISH: LanguageEntry = LanguageEntry {
    code: "en",
    name: "English",
    native_name: "English",
    script: None,
    no_response: "Sorry, I could not generate a response. Please try again.",
    error: "Sorry, something went wrong. Please try again later.",
};

static HINDI: LanguageEntry = LanguageEntry {
    code: "hi",
    name: "Hindi",
    native_name: "हिन्दी",
    script: Some("Devanagari"),
    no_response: "क्षमा करें, मैं उत्तर नहीं दे सका। कृपया पुनः प्रयास करें।",
    error: "क्षमा करें, कुछ गलत हो गया। कृपया बाद में पुनः प्रयास करें।",
};

static BENGALI: LanguageEntry = LanguageEntry {
    code: "bn",
    name: "Bengali",
    native_name: "বাংলা",
    script: Some("Bengali"),
    no_response: "দুঃখিত, আমি উত্তর তৈরি করতে পারিনি। অনুগ্রহ করে আবার চেষ্টা করুন।",
    error: "দুঃখিত, কিছু ভুল হয়েছে। অনুগ্রহ করে পরে আবার চেষ্টা করুন।",
};

static GUJARATI: LanguageEntry = LanguageEntry {
    code: "gu",
    name: "Gujarati",
    native_name: "ગુજરાતી",
    script: Some("Gujarati"),
    no_response: "માફ કરશો, હું જવાબ આપી શક્યો નહીં. કૃપા કરીને ફરી પ્રયાસ કરો.",
    error: "માફ કરશો, કંઈક ખોટું થયું. કૃપા કરીને પછીથી ફરી પ્રયાસ કરો.",
};

static MARATHI: LanguageEntry = LanguageEntry {
    code: "mr",
    name: "Marathi",
    native_name: "मराठी",
    script: Some("Devanagari"),
    no_response: "क्षमस्व, मी उत्तर देऊ शकलो नाही. कृपया पुन्हा प्रयत्न करा.",
    error: "क्षमस्व, काहीतरी चूक झाली. कृपया नंतर पुन्हा प्रयत्न करा.",
};

static TAMIL: LanguageEntry = LanguageEntry {
    code: "ta",
    name: "Tamil",
    native_name: "தமிழ்",
    script: Some("Tamil"),
    no_response: "மன்னிக்கவும், என்னால் பதிலளிக்க முடியவில்லை. மீண்டும் முயற்சிக்கவும்.",
    error: "மன்னிக்கவும், ஏதோ தவறு நடந்துவிட்டது. பின்னர் மீண்டும் முயற்சிக்கவும்.",
};

static TELUGU: LanguageEntry = LanguageEntry {
    code: "te",
    name: "Telugu",
    native_name: "తెలుగు",
    script: Some("Telugu"),
    no_response: "క్షమించండి, నేను సమాధానం ఇవ్వలేకపోయాను. దయచేసి మళ్ళీ ప్రయత్నించండి.",
    error: "క్షమించండి, ఏదో పొరపాటు జరిగింది. దయచేసి తర్వాత మళ్ళీ ప్రయత్నించండి.",
};

static KANNADA: LanguageEntry = LanguageEntry {
    code: "kn",
    name: "Kannada",
    native_name: "ಕನ್ನಡ",
    script: Some("Kannada"),
    no_response: "ಕ್ಷಮಿಸಿ, ನಾನು ಉತ್ತರ ನೀಡಲು ಸಾಧ್ಯವಾಗಲಿಲ್ಲ. ದಯವಿಟ್ಟು ಮತ್ತೆ ಪ್ರಯತ್ನಿಸಿ.",
    error: "ಕ್ಷಮಿಸಿ, ಏನೋ ತಪ್ಪಾಗಿದೆ. ದಯವಿಟ್ಟು ನಂತರ ಮತ್ತೆ ಪ್ರಯತ್ನಿಸಿ.",
};

static MALAYALAM: LanguageEntry = LanguageEntry {
    code: "ml",
    name: "Malayalam",
    native_name: "മലയാളം",
    script: Some("Malayalam"),
    no_response: "ക്ഷമിക്കണം, എനിക്ക് മറുപടി നൽകാൻ കഴിഞ്ഞില്ല. ദയവായി വീണ്ടും ശ്രമിക്കുക.",
    error: "ക്ഷമിക്കണം, എന്തോ പിശക് സംഭവിച്ചു. ദയവായി പിന്നീട് വീണ്ടും ശ്രമിക്കുക.",
};

static PUNJABI: LanguageEntry = LanguageEntry {
    code: "pa",
    name: "Punjabi",
    native_name: "ਪੰਜਾਬੀ",
    script: Some("Gurmukhi"),
    no_response: "ਮਾਫ਼ ਕਰਨਾ, ਮੈਂ ਜਵਾਬ ਨਹੀਂ ਦੇ ਸਕਿਆ। ਕਿਰਪਾ ਕਰਕੇ ਦੁਬਾਰਾ ਕੋਸ਼ਿਸ਼ ਕਰੋ।",
    error: "ਮਾਫ਼ ਕਰਨਾ, ਕੁਝ ਗਲਤ ਹੋ ਗਿਆ। ਕਿਰਪਾ ਕਰਕੇ ਬਾਅਦ ਵਿੱਚ ਦੁਬਾਰਾ ਕੋਸ਼ਿਸ਼ ਕਰੋ।",
};

static ODIA: LanguageEntry = LanguageEntry {
    code: "or",
    name: "Odia",
    native_name: "ଓଡ଼ିଆ",
    script: Some("Odia"),
    no_response: "କ୍ଷମା କରନ୍ତୁ, ମୁଁ ଉତ୍ତର ଦେଇ ପାରିଲି ନାହିଁ। ଦୟାକରି ପୁଣି ଚେଷ୍ଟା କରନ୍ତୁ।",
    error: "କ୍ଷମା କରନ୍ତୁ, କିଛି ଭୁଲ ହୋଇଗଲା। ଦୟାକରି ପରେ ପୁଣି ଚେଷ୍ଟା କରନ୍ତୁ।",
};

/// Languages the assistant can be asked to answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    English,
    Hindi,
    Bengali,
    Gujarati,
    Marathi,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Punjabi,
    Odia,
}

impl Language {
    pub const ALL: [Language; 11] = [
        Language::English,
        Language::Hindi,
        Language::Bengali,
        Language::Gujarati,
        Language::Marathi,
        Language::Tamil,
        Language::Telugu,
        Language::Kannada,
        Language::Malayalam,
        Language::Punjabi,
        Language::Odia,
    ];

    /// Resolve a language code such as `hi` or ` TA `. Unknown or empty
    /// codes resolve to English.
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.entry().code.eq_ignore_ascii_case(code))
            .unwrap_or_default()
    }

    /// Like [`Language::from_code`], treating a missing code as English.
    pub fn from_optional(code: Option<&str>) -> Self {
        code.map(Self::from_code).unwrap_or_default()
    }

    fn entry(&self) -> &'static LanguageEntry {
        match self {
            Language::English => &ENGLISH,
            Language::Hindi => &HINDI,
            Language::Bengali => &BENGALI,
            Language::Gujarati => &GUJARATI,
            Language::Marathi => &MARATHI,
            Language::Tamil => &TAMIL,
            Language::Telugu => &TELUGU,
            Language::Kannada => &KANNADA,
            Language::Malayalam => &MALAYALAM,
            Language::Punjabi => &PUNJABI,
            Language::Odia => &ODIA,
        }
    }

    pub fn code(&self) -> &'static str {
        self.entry().code
    }

    /// English name of the language.
    pub fn display_name(&self) -> &'static str {
        self.entry().name
    }

    pub fn native_name(&self) -> &'static str {
        self.entry().native_name
    }

    /// Wrap `prompt` with the instruction to answer in this language.
    pub fn wrap_prompt(&self, prompt: &str) -> String {
        match self.entry().script {
            Some(script) => format!(
                "{}\n\nRespond only in {} ({}), using {} script.",
                prompt,
                self.display_name(),
                self.native_name(),
                script
            ),
            None => format!("{}\n\nRespond in {}.", prompt, self.display_name()),
        }
    }

    /// Shown in place of a reply when the model returned no text.
    pub fn no_response_message(&self) -> &'static str {
        self.entry().no_response
    }

    /// Generic failure message shown to end users.
    pub fn error_message(&self) -> &'static str {
        self.entry().error
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_resolve() {
        assert_eq!(Language::from_code("hi"), Language::Hindi);
        assert_eq!(Language::from_code(" TA "), Language::Tamil);
        assert_eq!(Language::from_code("or"), Language::Odia);
    }

    #[test]
    fn every_language_round_trips_through_its_code() {
        for lang in Language::ALL {
            assert_eq!(Language::from_code(lang.code()), lang);
        }
    }

    #[test]
    fn unknown_codes_fall_back_to_english() {
        for code in ["", "xx", "fr", "hindi", "en-US"] {
            let lang = Language::from_code(code);
            assert_eq!(lang, Language::English, "code {:?}", code);
            assert_eq!(lang.wrap_prompt("Gir"), Language::English.wrap_prompt("Gir"));
            assert_eq!(lang.error_message(), Language::English.error_message());
            assert_eq!(
                lang.no_response_message(),
                Language::English.no_response_message()
            );
        }
        assert_eq!(Language::from_optional(None), Language::English);
    }

    #[test]
    fn wrap_prompt_places_prompt_first_and_names_language() {
        let wrapped = Language::Marathi.wrap_prompt("Describe Khillari cattle");
        assert!(wrapped.starts_with("Describe Khillari cattle"));
        assert!(wrapped.contains("Marathi"));
    }

    #[test]
    fn wrap_prompt_names_language_natively_and_its_script() {
        assert_eq!(
            Language::Hindi.wrap_prompt("Gir"),
            "Gir\n\nRespond only in Hindi (हिन्दी), using Devanagari script."
        );
        assert_eq!(
            Language::Punjabi.wrap_prompt("Sahiwal"),
            "Sahiwal\n\nRespond only in Punjabi (ਪੰਜਾਬੀ), using Gurmukhi script."
        );
    }

    #[test]
    fn wrap_prompt_keeps_braces_in_user_text() {
        let wrapped = Language::Hindi.wrap_prompt("what is {prompt}?");
        assert!(wrapped.starts_with("what is {prompt}?"));
    }

    #[test]
    fn wrap_prompt_passes_empty_prompt_through() {
        let wrapped = Language::English.wrap_prompt("");
        assert_eq!(wrapped, "\n\nRespond in English.");
    }
}
