use common::{Error, Result};

const MONTHS: [(&str, &str); 12] = [
    ("January", "Enero"),
    ("February", "Febrero"),
    ("March", "Marzo"),
    ("April", "Abril"),
    ("May", "Mayo"),
    ("June", "Junio"),
    ("July", "Julio"),
    ("August", "Agosto"),
    ("September", "Septiembre"),
    ("October", "Octubre"),
    ("November", "Noviembre"),
    ("December", "Diciembre"),
];

const WEEKDAYS: [(&str, &str); 7] = [
    ("Monday", "Lunes"),
    ("Tuesday", "Martes"),
    ("Wednesday", "Miércoles"),
    ("Thursday", "Jueves"),
    ("Friday", "Viernes"),
    ("Saturday", "Sábado"),
    ("Sunday", "Domingo"),
];

/// Spanish name for an English month name. A miss is a defect in the table.
pub fn localized_month(english: &str) -> Result<&'static str> {
    translate(&MONTHS, english)
}

/// Spanish name for an English weekday name. A miss is a defect in the table.
pub fn localized_weekday(english: &str) -> Result<&'static str> {
    translate(&WEEKDAYS, english)
}

fn translate(table: &[(&'static str, &'static str)], english: &str) -> Result<&'static str> {
    table
        .iter()
        .find(|(key, _)| *key == english)
        .map(|(_, localized)| *localized)
        .ok_or_else(|| Error::MissingTranslation(english.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_every_month_and_weekday() {
        assert_eq!(localized_month("September").unwrap(), "Septiembre");
        assert_eq!(localized_weekday("Wednesday").unwrap(), "Miércoles");
        assert_eq!(localized_weekday("Saturday").unwrap(), "Sábado");
    }

    #[test]
    fn unmapped_names_fail_loudly() {
        let err = localized_month("Sept").unwrap_err();
        assert!(matches!(err, Error::MissingTranslation(name) if name == "Sept"));
        assert!(localized_weekday("monday").is_err());
    }
}
