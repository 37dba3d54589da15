//! In-memory SF2 fixtures.
//!
//! [`SoundFontBuilder`] writes a complete `RIFF/sfbk` file from a few calls,
//! terminal records and all, so tests can describe a bank by its contents
//! instead of by hex dumps.
//!
//! ```ignore
//! let bytes = SoundFontBuilder::new()
//!     .preset("Piano", 0, 0)
//!     .preset_zone(&[(41, 0)])
//!     .instrument("Piano")
//!     .instrument_zone(&[(53, 0)])
//!     .sample("Piano C4", &[0, 100, -100], 1, 0)
//!     .build();
//! ```

/// Generator codes used by fixtures.
pub mod generator {
    pub const PAN: u16 = 17;
    pub const INSTRUMENT: u16 = 41;
    pub const KEY_RANGE: u16 = 43;
    pub const VEL_RANGE: u16 = 44;
    pub const SAMPLE_ID: u16 = 53;
}

/// Sample link type codes used by fixtures.
pub mod link {
    pub const MONO: u16 = 1;
    pub const RIGHT: u16 = 2;
    pub const LEFT: u16 = 4;
    pub const ROM_MONO: u16 = 0x8001;
}

/// `(source, destination, amount)` of one modulator record. Amount source and
/// transform are written as zero.
pub type ModulatorFixture = (u16, u16, i16);

#[derive(Clone, Debug)]
struct ZoneFixture {
    generators: Vec<(u16, u16)>,
    modulators: Vec<ModulatorFixture>,
}

impl ZoneFixture {
    fn new(generators: &[(u16, u16)], modulators: &[ModulatorFixture]) -> Self {
        Self {
            generators: generators.to_vec(),
            modulators: modulators.to_vec(),
        }
    }
}

#[derive(Clone, Debug)]
struct PresetFixture {
    name: String,
    program: u16,
    bank: u16,
    zones: Vec<ZoneFixture>,
}

#[derive(Clone, Debug)]
struct InstrumentFixture {
    name: String,
    zones: Vec<ZoneFixture>,
}

#[derive(Clone, Debug)]
struct SampleFixture {
    name: String,
    points: Vec<i16>,
    link_type: u16,
    link: u16,
}

/// Builder for a minimal but well-formed SF2 file.
#[derive(Clone, Debug)]
pub struct SoundFontBuilder {
    version: Option<(u16, u16)>,
    info: Vec<([u8; 4], String)>,
    presets: Vec<PresetFixture>,
    instruments: Vec<InstrumentFixture>,
    samples: Vec<SampleFixture>,
    omitted: Vec<[u8; 4]>,
}

impl Default for SoundFontBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn fourcc(id: &str) -> [u8; 4] {
    let mut out = [b' '; 4];
    for (slot, byte) in out.iter_mut().zip(id.bytes()) {
        *slot = byte;
    }
    out
}

fn name_slot(name: &str) -> [u8; 20] {
    let mut slot = [0u8; 20];
    for (dst, src) in slot.iter_mut().zip(name.bytes().take(19)) {
        *dst = src;
    }
    slot
}

fn chunk(id: [u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    out.extend_from_slice(&id);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    out
}

fn list(form: [u8; 4], children: &[u8]) -> Vec<u8> {
    let mut payload = form.to_vec();
    payload.extend_from_slice(children);
    chunk(*b"LIST", &payload)
}

/// Bag, generator and modulator tables for one level of the hierarchy.
struct ZoneChunks {
    bag_starts: Vec<u16>,
    bag_total: u16,
    bags: Vec<u8>,
    generators: Vec<u8>,
    modulators: Vec<u8>,
}

fn zone_chunks<'a>(entities: impl Iterator<Item = &'a Vec<ZoneFixture>>) -> ZoneChunks {
    let mut out = ZoneChunks {
        bag_starts: Vec::new(),
        bag_total: 0,
        bags: Vec::new(),
        generators: Vec::new(),
        modulators: Vec::new(),
    };
    let mut generator_count = 0u16;
    let mut modulator_count = 0u16;

    for zones in entities {
        out.bag_starts.push(out.bag_total);
        for zone in zones {
            out.bags.extend(generator_count.to_le_bytes());
            out.bags.extend(modulator_count.to_le_bytes());
            out.bag_total += 1;
            for &(code, value) in &zone.generators {
                out.generators.extend(code.to_le_bytes());
                out.generators.extend(value.to_le_bytes());
                generator_count += 1;
            }
            for &(source, destination, amount) in &zone.modulators {
                out.modulators.extend(source.to_le_bytes());
                out.modulators.extend(destination.to_le_bytes());
                out.modulators.extend(amount.to_le_bytes());
                out.modulators.extend([0u8; 4]);
                modulator_count += 1;
            }
        }
    }

    // Terminal records.
    out.bags.extend(generator_count.to_le_bytes());
    out.bags.extend(modulator_count.to_le_bytes());
    out.generators.extend([0u8; 4]);
    out.modulators.extend([0u8; 10]);
    out
}

impl SoundFontBuilder {
    pub fn new() -> Self {
        Self {
            version: Some((2, 1)),
            info: vec![
                (fourcc("isng"), "EMU8000".to_string()),
                (fourcc("INAM"), "Test Bank".to_string()),
            ],
            presets: Vec::new(),
            instruments: Vec::new(),
            samples: Vec::new(),
            omitted: Vec::new(),
        }
    }

    /// Set or replace a text field of the `INFO` list.
    pub fn info(mut self, id: &str, text: &str) -> Self {
        let id = fourcc(id);
        self.info.retain(|(existing, _)| *existing != id);
        self.info.push((id, text.to_string()));
        self
    }

    pub fn without_version(mut self) -> Self {
        self.version = None;
        self
    }

    pub fn preset(mut self, name: &str, program: u16, bank: u16) -> Self {
        self.presets.push(PresetFixture {
            name: name.to_string(),
            program,
            bank,
            zones: Vec::new(),
        });
        self
    }

    /// Add a zone of `(generator code, raw value)` pairs to the last preset.
    pub fn preset_zone(self, generators: &[(u16, u16)]) -> Self {
        self.preset_zone_with_modulators(generators, &[])
    }

    pub fn preset_zone_with_modulators(
        mut self,
        generators: &[(u16, u16)],
        modulators: &[ModulatorFixture],
    ) -> Self {
        if let Some(preset) = self.presets.last_mut() {
            preset.zones.push(ZoneFixture::new(generators, modulators));
        }
        self
    }

    pub fn instrument(mut self, name: &str) -> Self {
        self.instruments.push(InstrumentFixture {
            name: name.to_string(),
            zones: Vec::new(),
        });
        self
    }

    /// Add a zone of `(generator code, raw value)` pairs to the last instrument.
    pub fn instrument_zone(self, generators: &[(u16, u16)]) -> Self {
        self.instrument_zone_with_modulators(generators, &[])
    }

    pub fn instrument_zone_with_modulators(
        mut self,
        generators: &[(u16, u16)],
        modulators: &[ModulatorFixture],
    ) -> Self {
        if let Some(instrument) = self.instruments.last_mut() {
            instrument.zones.push(ZoneFixture::new(generators, modulators));
        }
        self
    }

    /// Append a sample. Loop points cover the whole sample.
    pub fn sample(mut self, name: &str, points: &[i16], link_type: u16, link: u16) -> Self {
        self.samples.push(SampleFixture {
            name: name.to_string(),
            points: points.to_vec(),
            link_type,
            link,
        });
        self
    }

    /// Leave out every chunk or `LIST` with this id or form type.
    pub fn omit_chunk(mut self, id: &str) -> Self {
        self.omitted.push(fourcc(id));
        self
    }

    fn emit(&self, out: &mut Vec<u8>, id: &str, payload: &[u8]) {
        let id = fourcc(id);
        if !self.omitted.contains(&id) {
            out.extend(chunk(id, payload));
        }
    }

    fn emit_list(&self, out: &mut Vec<u8>, form: &str, children: &[u8]) {
        let form = fourcc(form);
        if !self.omitted.contains(&form) {
            out.extend(list(form, children));
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut info = Vec::new();
        if let Some((major, minor)) = self.version {
            let mut payload = major.to_le_bytes().to_vec();
            payload.extend(minor.to_le_bytes());
            self.emit(&mut info, "ifil", &payload);
        }
        for (id, text) in &self.info {
            let mut payload = text.as_bytes().to_vec();
            payload.push(0);
            if payload.len() % 2 == 1 {
                payload.push(0);
            }
            if !self.omitted.contains(id) {
                info.extend(chunk(*id, &payload));
            }
        }

        let mut pool = Vec::new();
        let mut shdr = Vec::new();
        let mut point = 0u32;
        for sample in &self.samples {
            let start = point;
            let end = start + sample.points.len() as u32;
            for value in &sample.points {
                pool.extend(value.to_le_bytes());
            }
            point = end;
            shdr.extend(name_slot(&sample.name));
            for value in [start, end, start, end, 22050] {
                shdr.extend(value.to_le_bytes());
            }
            shdr.push(60);
            shdr.push(0);
            shdr.extend(sample.link.to_le_bytes());
            shdr.extend(sample.link_type.to_le_bytes());
        }
        shdr.extend(name_slot("EOS"));
        shdr.extend([0u8; 26]);

        let mut sdta = Vec::new();
        self.emit(&mut sdta, "smpl", &pool);

        let preset_zones = zone_chunks(self.presets.iter().map(|p| &p.zones));
        let mut phdr = Vec::new();
        for (preset, bag) in self.presets.iter().zip(&preset_zones.bag_starts) {
            phdr.extend(name_slot(&preset.name));
            phdr.extend(preset.program.to_le_bytes());
            phdr.extend(preset.bank.to_le_bytes());
            phdr.extend(bag.to_le_bytes());
            phdr.extend([0u8; 12]);
        }
        phdr.extend(name_slot("EOP"));
        phdr.extend([0u8; 4]);
        phdr.extend(preset_zones.bag_total.to_le_bytes());
        phdr.extend([0u8; 12]);

        let instrument_zones = zone_chunks(self.instruments.iter().map(|i| &i.zones));
        let mut inst = Vec::new();
        for (instrument, bag) in self.instruments.iter().zip(&instrument_zones.bag_starts) {
            inst.extend(name_slot(&instrument.name));
            inst.extend(bag.to_le_bytes());
        }
        inst.extend(name_slot("EOI"));
        inst.extend(instrument_zones.bag_total.to_le_bytes());

        let mut pdta = Vec::new();
        self.emit(&mut pdta, "phdr", &phdr);
        self.emit(&mut pdta, "pbag", &preset_zones.bags);
        self.emit(&mut pdta, "pmod", &preset_zones.modulators);
        self.emit(&mut pdta, "pgen", &preset_zones.generators);
        self.emit(&mut pdta, "inst", &inst);
        self.emit(&mut pdta, "ibag", &instrument_zones.bags);
        self.emit(&mut pdta, "imod", &instrument_zones.modulators);
        self.emit(&mut pdta, "igen", &instrument_zones.generators);
        self.emit(&mut pdta, "shdr", &shdr);

        let mut body = b"sfbk".to_vec();
        self.emit_list(&mut body, "INFO", &info);
        self.emit_list(&mut body, "sdta", &sdta);
        self.emit_list(&mut body, "pdta", &pdta);

        chunk(*b"RIFF", &body)
    }
}
