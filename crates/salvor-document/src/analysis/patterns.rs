// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Built-in keyword and marker tables.
//
// All patterns are lower-case and matched against a Latin-1 decoded,
// lower-cased byte prefix. Accented patterns therefore match WinAnsi/Latin-1
// encoded literal strings, not UTF-8 sequences.

use salvor_core::{DocumentKind, InstitutionFamily, Language};

/// Certificate vocabulary for one language.
#[derive(Debug)]
pub struct LanguageKeywords {
    pub language: Language,
    pub keywords: &'static [&'static str],
}

/// Immutable lookup tables used by the scanner and classifier.
#[derive(Debug)]
pub struct Lexicon {
    /// Per-language certificate vocabulary, in tie-breaking order.
    pub languages: &'static [LanguageKeywords],
    /// Body keywords that make a document a diploma.
    pub diploma_terms: &'static [&'static str],
    /// Body keywords that make a document a certificate.
    pub certificate_terms: &'static [&'static str],
    /// Body keywords that make a document a license.
    pub license_terms: &'static [&'static str],
    pub technologies: &'static [&'static str],
    /// Technology substrings that win over other technology matches.
    pub priority_technologies: &'static [&'static str],
    pub institutions: &'static [(&'static str, InstitutionFamily)],
    pub encryption_markers: &'static [&'static str],
    pub signature_markers: &'static [&'static str],
    pub permission_markers: &'static [&'static str],
    pub form_markers: &'static [&'static str],
    /// Cipher indicators; only meaningful next to an encryption marker.
    pub strong_cipher: &'static [&'static str],
    pub medium_cipher: &'static [&'static str],
    pub weak_cipher: &'static [&'static str],
    /// File-name substrings and the document kind they suggest.
    pub filename_hints: &'static [(&'static str, DocumentKind)],
}

/// Presence of compressed streams, under which keywords may be invisible.
pub const COMPRESSED_STREAM_MARKER: &str = "/flatedecode";

impl Lexicon {
    pub fn builtin() -> &'static Lexicon {
        &BUILTIN
    }
}

static BUILTIN: Lexicon = Lexicon {
    languages: &[
        LanguageKeywords {
            language: Language::Spanish,
            keywords: SPANISH,
        },
        LanguageKeywords {
            language: Language::English,
            keywords: ENGLISH,
        },
        LanguageKeywords {
            language: Language::Portuguese,
            keywords: PORTUGUESE,
        },
        LanguageKeywords {
            language: Language::French,
            keywords: FRENCH,
        },
        LanguageKeywords {
            language: Language::German,
            keywords: GERMAN,
        },
        LanguageKeywords {
            language: Language::Italian,
            keywords: ITALIAN,
        },
    ],
    diploma_terms: &["diploma", "degree", "título", "diplôme", "diplom"],
    certificate_terms: &[
        "certificate",
        "certificado",
        "certificat",
        "zertifikat",
        "certificato",
    ],
    license_terms: &["license", "licencia", "licence", "licença", "lizenz", "licenza"],
    technologies: TECHNOLOGIES,
    priority_technologies: &["tcpdf", "itext", "crystal reports", "docusign"],
    institutions: INSTITUTIONS,
    encryption_markers: &["/encrypt", "/stmf", "/strf", "/cfm", "/eff"],
    signature_markers: &[
        "/sig",
        "/byterange",
        "/subfilter",
        "/adbe.pkcs7.detached",
        "/adbe.pkcs7.sha1",
        "/adbe.x509.rsa_sha1",
        "/etsi.cades.detached",
    ],
    permission_markers: &["/p -", "/o (", "/u (", "/oe (", "/ue (", "/perms"],
    form_markers: &["/acroform", "/sigflags", "/xfa", "/needappearances"],
    strong_cipher: &["/v 4", "/v 5", "/r 6", "/length 256", "/aesv3"],
    medium_cipher: &["/v 2", "/v 3", "/length 128", "/aesv2"],
    weak_cipher: &["/v 1", "/length 40", "/rc4"],
    filename_hints: &[
        ("diploma", DocumentKind::Diploma),
        ("titulo", DocumentKind::Diploma),
        ("transcript", DocumentKind::Diploma),
        ("certificate", DocumentKind::Certificate),
        ("certificado", DocumentKind::Certificate),
        ("cert", DocumentKind::Certificate),
        ("constancia", DocumentKind::Certificate),
        ("license", DocumentKind::License),
        ("licencia", DocumentKind::License),
        ("qualification", DocumentKind::Credential),
        ("award", DocumentKind::Credential),
        ("completion", DocumentKind::Credential),
        ("credential", DocumentKind::Credential),
        ("badge", DocumentKind::Credential),
        ("achievement", DocumentKind::Credential),
        ("recognition", DocumentKind::Credential),
        ("capacitacion", DocumentKind::Credential),
        ("acreditacion", DocumentKind::Credential),
        ("seguridad", DocumentKind::Credential),
        ("safety", DocumentKind::Credential),
        ("prevencion", DocumentKind::Credential),
        ("riesgos", DocumentKind::Credential),
        ("achs", DocumentKind::Credential),
        ("mutual", DocumentKind::Credential),
        ("curso", DocumentKind::Credential),
        ("training", DocumentKind::Credential),
        ("formacion", DocumentKind::Credential),
        ("entrenamiento", DocumentKind::Credential),
        ("workshop", DocumentKind::Credential),
        ("seminario", DocumentKind::Credential),
    ],
};

const SPANISH: &[&str] = &[
    "certificado",
    "diploma",
    "título",
    "curso",
    "capacitación",
    "constancia",
    "acreditación",
    "licencia",
    "habilitación",
    "certificación",
    "credencial",
    "distintivo",
    "reconocimiento",
    "por haber cumplido",
    "satisfactoriamente",
    "otorga el presente",
    "se certifica que",
    "hace constar que",
    "certifica que",
    "aprobó el curso",
    "completó exitosamente",
    "finalizó el programa",
    "cumple con los requisitos",
    "ha demostrado competencia",
    "valida tu diploma",
    "valida tu certificado",
    "validar certificado",
    "verificar diploma",
    "código de verificación",
    "autenticidad",
    "achs",
    "seguro laboral",
    "asociación chilena de seguridad",
    "instituto de seguridad del trabajo",
    "ist chile",
    "instituto de seguridad laboral",
    "isl chile",
    "mutual de seguridad",
    "prevención de riesgos",
    "seguridad industrial",
    "higiene ocupacional",
    "salud en el trabajo",
    "elementos de protección personal",
    "trabajos en altura",
    "espacios confinados",
    "primeros auxilios",
    "evacuación y emergencias",
    "uso de extintores",
    "manejo defensivo",
    "codelco",
    "corporación nacional del cobre",
    "capacitación minera",
    "seguridad minera",
    "operación de equipos",
    "manejo de maquinaria pesada",
    "voladura",
    "tronadura",
    "geomecánica",
    "ventilación de minas",
    "gobierno de chile",
    "ministerio del trabajo",
    "dirección del trabajo",
    "sence",
    "suseso",
    "servicio nacional de capacitación",
    "superintendencia de seguridad social",
    "universidad de chile",
    "pontificia universidad católica",
    "universidad técnica federico santa maría",
    "universidad de concepción",
    "duoc uc",
    "inacap",
    "instituto aiep",
    "centro de formación técnica",
    "colegio de ingenieros",
    "colegio médico",
    "colegio de profesores",
    "colegio de contadores",
    "colegio de arquitectos",
    "cchc",
    "cámara chilena de la construcción",
    "sofofa",
    "sociedad de fomento fabril",
    "asimet",
    "sonami",
    "escondida",
    "anglo american",
];

const ENGLISH: &[&str] = &[
    "certificate",
    "diploma",
    "degree",
    "certification",
    "license",
    "accreditation",
    "qualification",
    "completion",
    "achievement",
    "training certificate",
    "course completion",
    "credential",
    "hereby certify",
    "has successfully completed",
    "is hereby awarded",
    "has demonstrated proficiency",
    "meets the requirements",
    "has earned",
    "is qualified",
    "is certified",
    "validate certificate",
    "verify diploma",
    "verification code",
    "authenticate document",
    "document verification",
    "safety training",
    "occupational health",
    "industrial hygiene",
    "risk assessment",
    "hazard identification",
    "personal protective equipment",
    "ppe training",
    "first aid",
    "cpr certification",
    "fire safety",
    "confined space",
    "working at heights",
    "hazardous materials",
    "defensive driving",
    "continuing education",
    "professional development",
    "skills assessment",
    "competency evaluation",
    "mining safety",
    "equipment operation",
    "heavy machinery",
    "blasting certification",
    "mine ventilation",
    "metallurgy",
    "mineral processing",
];

const PORTUGUESE: &[&str] = &[
    "certificado",
    "diploma",
    "título",
    "curso",
    "capacitação",
    "licença",
    "habilitação",
    "conclusão",
    "certificação",
    "credencial",
    "qualificação",
    "reconhecimento",
    "por ter completado",
    "satisfatoriamente",
    "concede o presente",
    "certifica que",
    "atesta que",
    "comprova que",
    "validar certificado",
    "verificar diploma",
    "segurança do trabalho",
    "saúde ocupacional",
    "prevenção de acidentes",
    "equipamentos de proteção",
    "primeiros socorros",
    "combate a incêndios",
];

const FRENCH: &[&str] = &[
    "certificat",
    "diplôme",
    "titre",
    "cours",
    "formation",
    "licence",
    "habilitation",
    "achèvement",
    "certification",
    "qualification",
    "reconnaissance",
    "attestation",
    "ayant satisfait",
    "avec succès",
    "décerne le présent",
    "certifie que",
    "atteste que",
    "confirme que",
    "valider certificat",
    "vérifier diplôme",
    "sécurité au travail",
    "santé occupationnelle",
    "prévention des risques",
    "équipements de protection",
    "premiers secours",
    "lutte contre l'incendie",
];

const GERMAN: &[&str] = &[
    "zertifikat",
    "diplom",
    "titel",
    "kurs",
    "ausbildung",
    "lizenz",
    "befähigung",
    "abschluss",
    "zertifizierung",
    "qualifikation",
    "anerkennung",
    "bescheinigung",
    "erfolgreich abgeschlossen",
    "hiermit bescheinigt",
    "bescheinigt dass",
    "bestätigt dass",
    "zertifikat validieren",
    "diplom verifizieren",
    "arbeitssicherheit",
    "arbeitsschutz",
    "risikobeurteilung",
    "schutzausrüstung",
    "erste hilfe",
    "brandschutz",
];

const ITALIAN: &[&str] = &[
    "certificato",
    "diploma",
    "titolo",
    "corso",
    "formazione",
    "licenza",
    "abilitazione",
    "completamento",
    "certificazione",
    "qualifica",
    "riconoscimento",
    "attestato",
    "aver completato",
    "con successo",
    "rilascia il presente",
    "certifica che",
    "attesta che",
    "conferma che",
    "validare certificato",
    "verificare diploma",
    "sicurezza sul lavoro",
    "salute occupazionale",
    "prevenzione rischi",
    "dispositivi di protezione",
    "primo soccorso",
    "antincendio",
];

const TECHNOLOGIES: &[&str] = &[
    // PDF libraries
    "tcpdf",
    "www.tcpdf.org",
    "powered by tcpdf",
    "itext",
    "itextpdf",
    "itextsharp",
    "fpdf",
    "dompdf",
    "wkhtmltopdf",
    "qt webkit",
    "prince xml",
    "princexml.com",
    "phantomjs",
    "headless chrome",
    "puppeteer",
    "playwright",
    // Report tools
    "crystal reports",
    "sap crystal",
    "business objects",
    "jasperreports",
    "jaspersoft",
    "pentaho reporting",
    "birt report",
    "ibm cognos",
    "reportlab",
    "weasyprint",
    "pdftk",
    "ghostscript",
    // Enterprise and learning platforms
    "peoplesoft",
    "workday",
    "successfactors",
    "cornerstone ondemand",
    "talentlms",
    "moodle",
    "blackboard",
    "canvas lms",
    "brightspace",
    "google classroom",
    // Government systems
    "sistema de capacitación",
    "plataforma sence",
    "registro nacional",
    "servicio civil",
    "contraloría general",
    // Signature services
    "firma digital",
    "digital signature",
    "signature électronique",
    "adobe acrobat",
    "docusign",
    "adobe sign",
    "hellosign",
    "signaturit",
    "signnow",
    "pandadoc",
    "certisign",
    "valid certificadora",
];

const INSTITUTIONS: &[(&str, InstitutionFamily)] = &[
    // Chilean safety mutuals
    ("achs", InstitutionFamily::SafetyMutual),
    ("asociación chilena de seguridad", InstitutionFamily::SafetyMutual),
    ("instituto de seguridad del trabajo", InstitutionFamily::SafetyMutual),
    ("instituto de seguridad laboral", InstitutionFamily::SafetyMutual),
    ("mutual de seguridad", InstitutionFamily::SafetyMutual),
    // Mining
    ("codelco", InstitutionFamily::Mining),
    ("corporación nacional del cobre", InstitutionFamily::Mining),
    ("escondida", InstitutionFamily::Mining),
    ("anglo american", InstitutionFamily::Mining),
    ("antofagasta minerals", InstitutionFamily::Mining),
    ("barrick", InstitutionFamily::Mining),
    ("kinross", InstitutionFamily::Mining),
    ("newmont", InstitutionFamily::Mining),
    ("freeport", InstitutionFamily::Mining),
    ("los pelambres", InstitutionFamily::Mining),
    ("sonami", InstitutionFamily::Mining),
    ("sociedad nacional de minería", InstitutionFamily::Mining),
    // Universities and technical institutes
    ("university", InstitutionFamily::University),
    ("universidad", InstitutionFamily::University),
    ("universidade", InstitutionFamily::University),
    ("université", InstitutionFamily::University),
    ("universität", InstitutionFamily::University),
    ("duoc uc", InstitutionFamily::University),
    ("inacap", InstitutionFamily::University),
    ("instituto aiep", InstitutionFamily::University),
    ("instituto profesional", InstitutionFamily::University),
    ("centro de formación técnica", InstitutionFamily::University),
    ("college", InstitutionFamily::University),
    ("facultad", InstitutionFamily::University),
    ("training center", InstitutionFamily::University),
    ("centro de capacitación", InstitutionFamily::University),
    // Government
    ("gobierno de chile", InstitutionFamily::Government),
    ("ministerio del trabajo", InstitutionFamily::Government),
    ("dirección del trabajo", InstitutionFamily::Government),
    ("suseso", InstitutionFamily::Government),
    ("sence", InstitutionFamily::Government),
    ("seremi", InstitutionFamily::Government),
    ("superintendencia", InstitutionFamily::Government),
    ("subsecretaría", InstitutionFamily::Government),
    ("contraloría", InstitutionFamily::Government),
    ("department of", InstitutionFamily::Government),
    ("ministério da", InstitutionFamily::Government),
    // Professional bodies and industry associations
    ("colegio de ingenieros", InstitutionFamily::ProfessionalBody),
    ("colegio médico", InstitutionFamily::ProfessionalBody),
    ("colegio de profesores", InstitutionFamily::ProfessionalBody),
    ("colegio de contadores", InstitutionFamily::ProfessionalBody),
    ("colegio de arquitectos", InstitutionFamily::ProfessionalBody),
    ("colegio de abogados", InstitutionFamily::ProfessionalBody),
    ("bar association", InstitutionFamily::ProfessionalBody),
    ("cámara chilena de la construcción", InstitutionFamily::ProfessionalBody),
    ("cchc", InstitutionFamily::ProfessionalBody),
    ("sofofa", InstitutionFamily::ProfessionalBody),
    ("asimet", InstitutionFamily::ProfessionalBody),
    ("cámara de comercio", InstitutionFamily::ProfessionalBody),
    // Certification bodies
    ("ieee", InstitutionFamily::CertificationBody),
    ("cissp", InstitutionFamily::CertificationBody),
    ("comptia", InstitutionFamily::CertificationBody),
    ("cisco", InstitutionFamily::CertificationBody),
    ("microsoft", InstitutionFamily::CertificationBody),
    ("amazon web services", InstitutionFamily::CertificationBody),
    ("salesforce", InstitutionFamily::CertificationBody),
    ("red hat", InstitutionFamily::CertificationBody),
    ("vmware", InstitutionFamily::CertificationBody),
    // Health and emergency services
    ("cruz roja", InstitutionFamily::Other),
    ("red cross", InstitutionFamily::Other),
    ("bomberos", InstitutionFamily::Other),
    ("fire department", InstitutionFamily::Other),
    ("defensa civil", InstitutionFamily::Other),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn all_patterns(lexicon: &Lexicon) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = Vec::new();
        for lang in lexicon.languages {
            out.extend(lang.keywords.iter().copied());
        }
        out.extend(lexicon.technologies.iter().copied());
        out.extend(lexicon.institutions.iter().map(|(p, _)| *p));
        out.extend(lexicon.filename_hints.iter().map(|(p, _)| *p));
        out.extend(lexicon.encryption_markers.iter().copied());
        out.extend(lexicon.signature_markers.iter().copied());
        out.extend(lexicon.permission_markers.iter().copied());
        out.extend(lexicon.form_markers.iter().copied());
        out
    }

    #[test]
    fn patterns_are_lowercase() {
        for pattern in all_patterns(Lexicon::builtin()) {
            assert_eq!(pattern, pattern.to_lowercase(), "pattern {pattern:?}");
        }
    }

    #[test]
    fn patterns_fit_in_latin1() {
        for pattern in all_patterns(Lexicon::builtin()) {
            assert!(
                pattern.chars().all(|c| (c as u32) < 256),
                "pattern {pattern:?} cannot match a Latin-1 decoded prefix"
            );
        }
    }

    #[test]
    fn every_language_is_covered_once() {
        let langs: Vec<Language> = Lexicon::builtin()
            .languages
            .iter()
            .map(|l| l.language)
            .collect();
        assert_eq!(langs, Language::DETECTABLE.to_vec());
    }
}
