//! Instructions sent with each oracle request. Spanish on purpose: the
//! documents are Spanish-language statements and the column vocabulary
//! (RETIROS, ABONOS, SALDO) is what the oracle must anchor on.

/// Ask which of the attached thumbnails show a movements table. `pages`
/// are the real 1-indexed page numbers, in the order the images are
/// attached.
pub fn relevance(pages: &[u32]) -> String {
    let listed = pages
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "De estas páginas de un estado de cuenta, identifica cuáles contienen una TABLA de movimientos\n\
         (con columnas tipo FECHA, CONCEPTO/DESCRIPCIÓN, RETIROS/CARGOS, DEPÓSITOS/ABONOS y SALDO).\n\
         Ignora portada, avisos, glosarios, publicidad.\n\
         Ignora anotaciones a mano.\n\
         Devuelve SOLO JSON con \"pages\": [números de página] usando los números REALES de estas páginas:\n\
         {listed}"
    )
}

/// Extraction rules for the full-resolution pass.
pub const EXTRACTION: &str = "\
Extrae la tabla de movimientos bancarios de estas páginas.\n\
Reglas:\n\
- Devuelve SOLO JSON según el schema.\n\
- Ignora anotaciones manuscritas.\n\
- Si falta un valor, usa 0.\n\
- Normaliza fechas a YYYY-MM-DD si puedes.\n\
- \"retiros\" y \"depositos\" deben ser números.\n\
- Si hay Cargo/Abono: Cargo=retiros, Abono=depositos.\n\
- NO inventes filas.";
