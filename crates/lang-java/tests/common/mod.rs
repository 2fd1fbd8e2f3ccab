use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Assembles a minimal class file (Java 8 format, no attributes).
pub struct ClassBytes {
    pool: Vec<Vec<u8>>,
    utf8_index: HashMap<String, u16>,
    class_index: HashMap<String, u16>,
    access: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<(u16, u16, u16)>,
    methods: Vec<(u16, u16, u16)>,
}

#[allow(dead_code)]
impl ClassBytes {
    pub fn new(name: &str, super_name: Option<&str>) -> Self {
        let mut class = Self {
            pool: Vec::new(),
            utf8_index: HashMap::new(),
            class_index: HashMap::new(),
            access: 0x0021,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        };
        class.this_class = class.class_ref(name);
        if let Some(super_name) = super_name {
            class.super_class = class.class_ref(super_name);
        }
        class
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        let index = self.class_ref(name);
        self.interfaces.push(index);
        self
    }

    pub fn field(mut self, access: u16, name: &str, descriptor: &str) -> Self {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.fields.push((access, name, descriptor));
        self
    }

    pub fn method(mut self, access: u16, name: &str, descriptor: &str) -> Self {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.methods.push((access, name, descriptor));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&[0xCA, 0xFE, 0xBA, 0xBE]);
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&52u16.to_be_bytes());
        out.extend_from_slice(&(self.pool.len() as u16 + 1).to_be_bytes());
        for constant in &self.pool {
            out.extend_from_slice(constant);
        }
        out.extend_from_slice(&self.access.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for interface in &self.interfaces {
            out.extend_from_slice(&interface.to_be_bytes());
        }
        for members in [&self.fields, &self.methods] {
            out.extend_from_slice(&(members.len() as u16).to_be_bytes());
            for (access, name, descriptor) in members {
                out.extend_from_slice(&access.to_be_bytes());
                out.extend_from_slice(&name.to_be_bytes());
                out.extend_from_slice(&descriptor.to_be_bytes());
                out.extend_from_slice(&0u16.to_be_bytes());
            }
        }
        out.extend_from_slice(&0u16.to_be_bytes());
        out
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(index) = self.utf8_index.get(value) {
            return *index;
        }
        let mut constant = vec![1u8];
        constant.extend_from_slice(&(value.len() as u16).to_be_bytes());
        constant.extend_from_slice(value.as_bytes());
        self.pool.push(constant);
        let index = self.pool.len() as u16;
        self.utf8_index.insert(value.to_string(), index);
        index
    }

    fn class_ref(&mut self, name: &str) -> u16 {
        if let Some(index) = self.class_index.get(name) {
            return *index;
        }
        let name_index = self.utf8(name);
        let mut constant = vec![7u8];
        constant.extend_from_slice(&name_index.to_be_bytes());
        self.pool.push(constant);
        let index = self.pool.len() as u16;
        self.class_index.insert(name.to_string(), index);
        index
    }
}

#[allow(dead_code)]
pub fn create_test_jar(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    for (name, bytes) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(bytes).unwrap();
    }

    zip.finish().unwrap();
}

#[allow(dead_code)]
pub fn read_jar_entry(path: &Path, name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut bytes = Vec::new();
    std::io::Read::read_to_end(&mut entry, &mut bytes).unwrap();
    bytes
}
