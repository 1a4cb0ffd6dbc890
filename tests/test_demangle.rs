use cxx_demangle::{
    arguments, demangle_full_signature, demangle_symbol, get_next_argument, Error, NameBuffer,
    TypeTag,
};
use std::mem::size_of;

fn demangled(mangled: &str) -> String {
    demangle_full_signature(mangled)
}

#[test]
fn test_itanium_scenarios() {
    assert_eq!(demangled("_Z3fooiPKc"), "foo(int, char const*)");
    assert_eq!(demangled("_ZN3foo3barEv"), "foo::bar()");
    assert_eq!(
        demangled("_ZN3foo3barC1ERKS0_"),
        "foo::bar::bar(foo::bar const&)"
    );
    assert_eq!(
        demangled("_ZN9__gnu_cxx17__normal_iteratorIPKcSsE4baseEv"),
        "__gnu_cxx::__normal_iterator<char const*, \
         std::basic_string<char, std::char_traits<char>, std::allocator<char> > >::base()"
    );
    assert_eq!(
        demangled("_ZTVN10__cxxabiv120__si_class_type_infoE"),
        "vtable for __cxxabiv1::__si_class_type_info"
    );
}

#[test]
fn test_legacy_scenario() {
    // the legacy argument enumerator cannot name function-pointer types,
    // so the callback argument falls back to its pointer tag
    assert_eq!(
        demangled("SyncDraw__Q28BPrivate9IconCachePQ28BPrivate5ModelP5BViewG6BPointQ28BPrivate12IconDrawMode9icon_sizePFP5BViewG6BPointP7BBitmapPv_vPv"),
        "BPrivate::IconCache::SyncDraw(BPrivate::Model*, BView*, BPoint, \
         BPrivate::IconDrawMode, icon_size, void*, void*)"
    );

    // the Itanium twin of the same symbol names the callback in full
    assert_eq!(
        demangled("_ZN8BPrivate9IconCache8SyncDrawEPNS_5ModelEP5BView6BPointNS_12IconDrawModeE9icon_sizePFvS4_S5_P7BBitmapPvESA_"),
        "BPrivate::IconCache::SyncDraw(BPrivate::Model*, BView*, BPoint, \
         BPrivate::IconDrawMode, icon_size, void (*)(BView*, BPoint, BBitmap*, void*), void*)"
    );
}

#[test]
fn test_special_names() {
    assert_eq!(
        demangled("_ZTIN3foo3barE"),
        "typeinfo for foo::bar"
    );
    assert_eq!(
        demangled("_ZTSN3foo3barE"),
        "typeinfo name for foo::bar"
    );
    assert_eq!(demangled("_ZTTN3foo3barE"), "VTT for foo::bar");
    assert_eq!(demangled("_ZGVN3foo3barE"), "guard variable for foo::bar");
    assert_eq!(
        demangled("_ZThn8_N3foo3barEv"),
        "non-virtual thunk to foo::bar()"
    );
    assert_eq!(
        demangled("_ZTv0_n12_N3foo3barEv"),
        "virtual thunk to foo::bar()"
    );
    assert_eq!(
        demangled("_ZTch0_h4_N3foo3barEv"),
        "covariant return thunk to foo::bar()"
    );
}

#[test]
fn test_operators_and_literals() {
    assert_eq!(demangled("_ZN3fooplERKS_"), "foo::operator+(foo const&)");
    assert_eq!(demangled("_ZN3fooixEi"), "foo::operator[](int)");
    assert_eq!(demangled("_ZN3foocviEv"), "foo::operator int()");
    assert_eq!(demangled("_ZN3foonwEm"), "foo::operator new(unsigned long)");
    // non-type template arguments
    assert_eq!(demangled("_Z3fooILi7EEvv"), "void foo<7>()");
    assert_eq!(demangled("_Z3fooILb1EEvv"), "void foo<true>()");
    assert_eq!(demangled("_Z3fooILln3EEEvv"), "void foo<(long)-3>()");
}

#[test]
fn test_local_and_vendor_names() {
    assert_eq!(demangled("_ZZN3foo3barEvE5local"), "foo::bar()::local");
    assert_eq!(demangled("_ZZN3foo3barEvEs"), "foo::bar()::string literal");
    assert_eq!(demangled("_Z3fooU5fancyi"), "foo(int fancy)");
    assert_eq!(demangled("_Z3foou8MyScalar"), "foo(MyScalar)");
}

#[test]
fn test_compound_types() {
    assert_eq!(demangled("_Z3fooA7_i"), "foo(int[7])");
    assert_eq!(demangled("_Z3fooM3BarFviE"), "foo(void (Bar::*)(int))");
    assert_eq!(demangled("_Z3fooRA4_Kc"), "foo(char const[4]&)");
    assert_eq!(demangled("_Z3fooOi"), "foo(int&&)");
    assert_eq!(demangled("_Z3fooCd"), "foo(double complex)");
}

#[test]
fn test_substitution_equivalence() {
    // spelling a type out or back-referencing it renders the same
    assert_eq!(demangled("_Z3fooPiS_"), demangled("_Z3fooPiPi"));
    assert_eq!(
        demangled("_Z3fooN1a1bEN1a1cE"),
        // S_ is a, S0_ is a::b
        demangled("_Z3fooN1a1bENS_1cE")
    );
}

#[test]
fn test_cv_qualifier_placement() {
    // the const of a member function sits after the parameter list
    let name = demangled("_ZNK3Foo3barEi");
    assert_eq!(name, "Foo::bar(int) const");
    assert_eq!(name.matches("const").count(), 1);

    // and before outer type decorations of a member pointer
    assert_eq!(
        demangled("_Z3fooM3BarKFvvE"),
        "foo(void (Bar::*)() const)"
    );
}

#[test]
fn test_parameter_count_matches_rendered_list() {
    for symbol in [
        "_Z3fooiPKc",
        "_ZN3foo3barEv",
        "_Z3fooA7_iRA4_Kcd",
        "_ZN8BPrivate9IconCache8SyncDrawEPNS_5ModelEP5BView6BPointNS_12IconDrawModeE9icon_sizePFvS4_S5_P7BBitmapPvESA_",
        "SyncDraw__Q28BPrivate9IconCachePQ28BPrivate5ModelP5BViewG6BPointQ28BPrivate12IconDrawMode9icon_sizePFP5BViewG6BPointP7BBitmapPv_vPv",
        "func__FilUcdb",
    ] {
        let rendered = demangled(symbol);

        // top-level ", " count inside the outermost parameter list
        let open = rendered.find('(').unwrap();
        let list = &rendered[open + 1..rendered.rfind(')').unwrap()];
        let mut depth = 0usize;
        let mut separators = 0usize;
        for (i, c) in list.char_indices() {
            match c {
                '(' | '<' | '[' => depth += 1,
                ')' | '>' | ']' => depth = depth.saturating_sub(1),
                ',' if depth == 0 && list[i + 1..].starts_with(' ') => separators += 1,
                _ => {}
            }
        }
        let rendered_count = if list.is_empty() { 0 } else { separators + 1 };

        assert_eq!(
            arguments(symbol).count(),
            rendered_count,
            "parameter count mismatch for {symbol} -> {rendered}"
        );
    }
}

#[test]
fn test_round_trip_locality() {
    // an already-demangled name never turns into a different plausible one
    for name in ["foo::bar(int)", "operator new", "main", "a: b"] {
        let mut buffer = NameBuffer::new(1024);
        assert_eq!(demangle_symbol(name, &mut buffer), Err(Error::NotMangled));
        assert_eq!(demangle_full_signature(name), name);
    }
}

#[test]
fn test_boundary_behaviors() {
    let mut buffer = NameBuffer::new(1024);
    assert_eq!(demangle_symbol("", &mut buffer), Err(Error::NotMangled));

    // "_Z" alone has no encoding; the legacy fallback rejects it too
    let mut buffer = NameBuffer::new(1024);
    assert_eq!(demangle_symbol("_Z", &mut buffer), Err(Error::NotMangled));

    // zero-capacity output buffer
    let mut buffer = NameBuffer::new(0);
    assert_eq!(
        demangle_symbol("_Z3foov", &mut buffer),
        Err(Error::BufferTooSmall)
    );

    // a repeat code with no preceding argument
    let mut cookie = 0;
    let mut buffer = NameBuffer::new(64);
    assert_eq!(
        get_next_argument(&mut cookie, "foo__FN21", &mut buffer),
        Err(Error::Invalid)
    );

    // a back-reference past the end of the list runs off the arguments
    let mut cookie = 2;
    let mut buffer = NameBuffer::new(64);
    assert_eq!(
        get_next_argument(&mut cookie, "foo__FiiT9", &mut buffer),
        Err(Error::NoMoreArguments)
    );
}

#[test]
fn test_method_flags() {
    let cases = [
        ("_Z3fooi", false),
        ("_ZN3foo3barEv", true),
        ("_ZN3fooC1Ev", false),
        ("_ZN3foocviEv", true),
        ("_ZN3foo3barE", false),
        ("SetTo__9BDirectoryP9BVolumePc", true),
        ("Name__C5BNode", true),
        ("get_area__Fi", false),
    ];
    for (symbol, expected) in cases {
        let mut buffer = NameBuffer::new(1024);
        let (_, is_method) = demangle_symbol(symbol, &mut buffer).unwrap();
        assert_eq!(is_method, expected, "method flag mismatch for {symbol}");
    }
}

#[test]
fn test_argument_sizes_use_pointer_width() {
    let mut cookie = 1;
    let mut buffer = NameBuffer::new(64);
    let argument = get_next_argument(&mut cookie, "_Z3fooiPKc", &mut buffer).unwrap();
    assert_eq!(argument.tag, TypeTag::ConstCharPointer);
    assert_eq!(argument.size, size_of::<usize>());

    let mut cookie = 0;
    let mut buffer = NameBuffer::new(64);
    let argument = get_next_argument(&mut cookie, "SetTo__9BDirectoryP9BVolumePc", &mut buffer).unwrap();
    assert_eq!(argument.tag, TypeTag::Pointer);
    assert_eq!(argument.size, size_of::<usize>());
}

struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

#[test]
fn test_random_input_never_panics() {
    let mut rng = XorShift(0x4d45_4c54_4544_u64);

    for round in 0..4096 {
        let length = (rng.next() % 257) as usize;
        let mut bytes = Vec::with_capacity(length + 2);
        if round % 2 == 0 {
            bytes.extend_from_slice(b"_Z");
        }
        for _ in 0..length {
            // printable ASCII keeps the input a valid &str
            bytes.push((rng.next() % 95) as u8 + 0x20);
        }
        let input = String::from_utf8(bytes).unwrap();

        // whatever comes back must be a clean Result, not a panic
        let mut buffer = NameBuffer::new(256);
        let _ = demangle_symbol(&input, &mut buffer);

        let _ = demangle_full_signature(&input);

        for argument in arguments(&input).take(64) {
            let _ = argument;
        }
    }
}

#[test]
fn test_mangled_fragments_never_panic() {
    // mutations of real symbols probe the parser's edge cases harder than
    // uniform noise
    let seeds = [
        "_ZN9__gnu_cxx17__normal_iteratorIPKcSsE4baseEv",
        "_ZN8BPrivate9IconCache8SyncDrawEPNS_5ModelEP5BView6BPointNS_12IconDrawModeE9icon_sizePFvS4_S5_P7BBitmapPvESA_",
        "_ZTch0_h4_N3foo3barEv",
        "_Z3fooILln3EEEvv",
        "SyncDraw__Q28BPrivate9IconCachePQ28BPrivate5ModelP5BViewG6BPointQ28BPrivate12IconDrawMode9icon_sizePFP5BViewG6BPointP7BBitmapPv_vPv",
    ];
    let mut rng = XorShift(0x6265_6f73_u64);

    for seed in seeds {
        for _ in 0..512 {
            let mut bytes = seed.as_bytes().to_vec();
            let cut = (rng.next() as usize) % bytes.len();
            match rng.next() % 3 {
                0 => bytes.truncate(cut),
                1 => bytes[cut] = (rng.next() % 95) as u8 + 0x20,
                _ => bytes.insert(cut, (rng.next() % 95) as u8 + 0x20),
            }
            let input = String::from_utf8(bytes).unwrap();

            let mut buffer = NameBuffer::new(128);
            let _ = demangle_symbol(&input, &mut buffer);
            for argument in arguments(&input).take(64) {
                let _ = argument;
            }
        }
    }
}
