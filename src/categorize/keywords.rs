// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Built-in keyword table for the offline categorization engine
//!
//! Keywords are written in canonical form (lowercase, no accents,
//! singular); the matcher re-normalizes them on load anyway, so an
//! accented or plural entry here would not break anything. Multi-word
//! keywords exist to beat their shorter prefixes: "tomate frito" must
//! win over "tomate", "naranjada" over "naranja".

use crate::model::Category;

/// Category keyword seed data. `Otros` carries no keywords; it only
/// ever applies as a fallback.
pub const DEFAULT_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::FrutasYVerduras,
        &[
            "manzana", "platano", "naranja", "mandarina", "limon", "pera", "uva", "fresa",
            "frambuesa", "arandano", "cereza", "ciruela", "melocoton", "albaricoque", "granada",
            "melon", "sandia", "kiwi", "mango", "pina", "aguacate", "datil", "higo", "tomate",
            "cebolla", "ajo", "patata", "boniato", "zanahoria", "lechuga", "ensalada", "canonigo",
            "rucula", "escarola", "endibia", "espinaca", "acelga", "brocoli", "coliflor", "col",
            "repollo", "calabacin", "calabaza", "berenjena", "pimiento", "pepino", "champinon",
            "seta", "judia verde", "puerro", "apio", "perejil", "cilantro", "albahaca", "menta",
            "hierbabuena", "esparrago", "alcachofa", "remolacha", "nabo", "rabano", "jengibre",
        ],
    ),
    (
        Category::CarnesYPescados,
        &[
            "pollo", "pavo", "ternera", "cerdo", "cordero", "conejo", "filete", "solomillo",
            "costilla", "chuleta", "lomo", "jamon", "bacon", "panceta", "salchicha", "chorizo",
            "morcilla", "salami", "mortadela", "pechuga", "alita", "albondiga", "hamburguesa",
            "higado", "merluza", "pescadilla", "salmon", "bacalao", "dorada", "lubina", "sardina",
            "boqueron", "trucha", "rape", "rodaballo", "caballa", "emperador", "atun fresco",
            "gamba", "langostino", "calamar", "sepia", "pulpo", "mejillon", "almeja",
            "berberecho", "cangrejo", "surimi", "marisco",
        ],
    ),
    (
        Category::LacteosYHuevos,
        &[
            "leche", "yogur", "queso", "mantequilla", "margarina", "nata", "huevo", "kefir",
            "cuajada", "requeson", "batido", "flan", "natillas", "mozzarella", "parmesano",
            "cheddar", "feta", "ricotta", "mascarpone", "burrata",
        ],
    ),
    (
        Category::PanaderiaYCereales,
        &[
            "pan", "baguette", "chapata", "pan de molde", "pan rallado", "picos", "colin",
            "tostada", "galleta", "bizcocho", "magdalena", "croissant", "napolitana", "donut",
            "cereal", "avena", "muesli", "granola", "harina", "levadura", "masa", "hojaldre",
            "tortita", "barrita",
        ],
    ),
    (
        Category::ConservasYDespensa,
        &[
            "atun", "sardinilla", "anchoa", "conserva", "tomate frito", "tomate triturado",
            "leche condensada", "leche evaporada", "aceite", "vinagre", "sal", "azucar",
            "pimienta", "pimenton", "oregano", "comino", "curcuma", "canela", "vainilla",
            "nuez moscada", "laurel", "azafran", "miel", "mermelada", "cacao", "chocolate",
            "cafe", "te", "manzanilla", "infusion", "arroz", "lenteja", "garbanzo", "alubia",
            "quinoa", "cuscus", "pasta", "espagueti", "macarron", "fideo", "tallarin", "legumbre",
            "caldo", "sopa", "pure", "pure de patata", "salsa", "mayonesa", "ketchup", "mostaza",
            "salsa de soja", "nuez", "almendra", "avellana", "cacahuete", "pistacho", "pipa",
            "pasa", "aceituna", "pepinillo", "maiz",
        ],
    ),
    (
        Category::Congelados,
        &[
            "helado", "hielo", "congelado", "congelada", "pizza", "croqueta", "empanadilla",
            "nugget", "palito de merluza", "patata frita", "guisante", "menestra",
        ],
    ),
    (
        Category::Bebidas,
        &[
            "agua", "agua con gas", "zumo", "nectar", "refresco", "cola", "naranjada",
            "limonada", "gaseosa", "tonica", "cerveza", "vino", "cava", "sidra", "vermut",
            "ron", "ginebra", "whisky", "vodka", "licor", "horchata", "mosto", "bebida",
            "bebida energetica", "isotonica", "kombucha",
        ],
    ),
    (
        Category::LimpiezaYHogar,
        &[
            "detergente", "suavizante", "lejia", "amoniaco", "limpiador", "limpiacristales",
            "fregasuelos", "lavavajillas", "abrillantador", "desengrasante", "estropajo",
            "bayeta", "fregona", "escoba", "recogedor", "guante", "bolsa de basura",
            "papel de cocina", "papel higienico", "servilleta", "papel de aluminio",
            "film transparente", "ambientador", "insecticida", "vela", "pila", "bombilla",
            "cerilla", "mechero", "trapo",
        ],
    ),
    (
        Category::HigieneYSalud,
        &[
            "champu", "acondicionador", "gel", "jabon", "pasta de dientes", "dentifrico",
            "cepillo de dientes", "enjuague", "colutorio", "desodorante", "colonia", "perfume",
            "crema", "locion", "protector solar", "bastoncillo", "algodon", "tirita", "gasa",
            "alcohol", "agua oxigenada", "aspirina", "paracetamol", "ibuprofeno", "vitamina",
            "compresa", "tampon", "panal", "toallita", "maquinilla", "cuchilla",
            "espuma de afeitar", "hilo dental", "termometro",
        ],
    ),
    (Category::Otros, &[]),
];
